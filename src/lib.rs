// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate accepts contact form submissions over HTTP and relays them by
//! email, guarded by:
//!
//! - Field validation (name, email, message lengths and shape)
//! - Per-client sliding-window rate limiting (5 submissions per 15 minutes default)
//! - Bounded memory for tracked clients (idle sweep and cardinality cap)
//! - Opaque error reporting for mail relay failures

pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod relay;
pub mod validator;

pub use config::Config;
pub use error::AppError;
pub use limiter::{Decision, RateLimiter};
pub use relay::{MailRelay, RelayError, SmtpRelay};
pub use validator::{ContactRequest, ContactSubmission, ContactValidator, ValidationError};
