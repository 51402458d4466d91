// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the contact relay service

use crate::relay::RelayError;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed request body: {detail}")]
    MalformedBody { status: StatusCode, detail: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("Mail relay is not configured")]
    RelayUnavailable,

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody { status, .. } => *status,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::RelayUnavailable | Self::Relay(_) | Self::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedBody { .. } => "MALFORMED_BODY",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::RelayUnavailable => "RELAY_UNAVAILABLE",
            Self::Relay(_) => "RELAY_FAILED",
            Self::Metrics(_) => "INTERNAL",
        }
    }

    /// Message safe to show to the caller. Relay and internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::MalformedBody { detail, .. } => detail.clone(),
            Self::Validation(err) => err.to_string(),
            Self::RateLimited { .. } => {
                "Too many requests. Please wait a few minutes before trying again.".to_string()
            }
            Self::RelayUnavailable => {
                "Email service is not configured. Please contact me directly.".to_string()
            }
            Self::Relay(_) => "Failed to send your message. Please try again later.".to_string(),
            Self::Metrics(_) => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Whole seconds, rounded up so clients never retry early.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code(),
            field: match &self {
                Self::Validation(err) => Some(err.field()),
                _ => None,
            },
            retry_after_secs: match &self {
                Self::RateLimited { retry_after } => Some(retry_after_secs(*retry_after)),
                _ => None,
            },
        };

        match body.retry_after_secs {
            Some(secs) => (
                status,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(body),
            )
                .into_response(),
            None => (status, Json(body)).into_response(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
