// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for contact relay abuse simulation.
//!
//! Drives the validator and the rate limiter with simulated traffic on a
//! virtual clock, so window behaviour can be checked without sleeping.

pub mod attacks;
pub mod generators;
pub mod metrics;
