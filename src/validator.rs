// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form validator.
//!
//! Normalizes and checks a submission before it may be relayed:
//! - Name length after trimming
//! - Email address shape (`local@domain.tld`), lowercased
//! - Message length after trimming

use crate::config::ValidationConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Raw contact form body as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A submission that passed validation, with normalized fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must be at least {min} characters.")]
    NameTooShort { min: usize },

    #[error("Name must be at most {max} characters.")]
    NameTooLong { max: usize },

    #[error("Please provide a valid email address.")]
    InvalidEmail,

    #[error("Message must be at least {min} characters.")]
    MessageTooShort { min: usize },

    #[error("Message must be at most {max} characters.")]
    MessageTooLong { max: usize },
}

impl ValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameTooShort { .. } | Self::NameTooLong { .. } => "name",
            Self::InvalidEmail => "email",
            Self::MessageTooShort { .. } | Self::MessageTooLong { .. } => "message",
        }
    }
}

/// Contact form validator.
pub struct ContactValidator {
    config: ValidationConfig,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate_name(&self, name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        let len = name.chars().count();
        if len < self.config.name_min_chars {
            debug!(len, "Name too short");
            return Err(ValidationError::NameTooShort {
                min: self.config.name_min_chars,
            });
        }
        if len > self.config.name_max_chars {
            debug!(len, "Name too long");
            return Err(ValidationError::NameTooLong {
                max: self.config.name_max_chars,
            });
        }
        Ok(name.to_string())
    }

    pub fn validate_email(&self, email: &str) -> Result<String, ValidationError> {
        let email = email.trim().to_lowercase();
        if is_plausible_email(&email) {
            Ok(email)
        } else {
            debug!("Email address rejected");
            Err(ValidationError::InvalidEmail)
        }
    }

    pub fn validate_message(&self, message: &str) -> Result<String, ValidationError> {
        let message = message.trim();
        let len = message.chars().count();
        if len < self.config.message_min_chars {
            debug!(len, "Message too short");
            return Err(ValidationError::MessageTooShort {
                min: self.config.message_min_chars,
            });
        }
        if len > self.config.message_max_chars {
            debug!(len, "Message too long");
            return Err(ValidationError::MessageTooLong {
                max: self.config.message_max_chars,
            });
        }
        Ok(message.to_string())
    }

    /// Validate a complete submission, reporting the first failing field.
    pub fn validate(&self, request: &ContactRequest) -> Result<ContactSubmission, ValidationError> {
        Ok(ContactSubmission {
            name: self.validate_name(&request.name)?,
            email: self.validate_email(&request.email)?,
            message: self.validate_message(&request.message)?,
        })
    }
}

/// Match `^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$` (ASCII, case-insensitive).
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    if !local_ok {
        return false;
    }

    // The TLD is everything after the last dot; an earlier split would put a
    // dot inside the TLD, which can never match.
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    host_ok && tld_ok
}
