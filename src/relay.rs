// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail relay for accepted contact submissions.
//!
//! The HTTP layer only sees the [`MailRelay`] trait; [`SmtpRelay`] is the
//! production implementation backed by an async SMTP transport.

use crate::config::SmtpConfig;
use crate::validator::ContactSubmission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, AsyncSmtpTransport},
    AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{debug, warn};

/// SMTP reply codes that mean the relay refused our credentials.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

/// Mail relay failures. The detail is for logs only.
#[derive(Debug, Error, Clone)]
pub enum RelayError {
    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("SMTP transport failed: {0}")]
    Transport(String),

    #[error("Could not build message: {0}")]
    Message(String),
}

impl RelayError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::Transport(_) => "transport",
            Self::Message(_) => "message",
        }
    }
}

/// Delivers validated submissions somewhere a human will read them.
#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn relay(&self, submission: &ContactSubmission) -> Result<(), RelayError>;
}

/// SMTP-backed relay.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpRelay {
    /// Build a relay from configuration, or `None` when credentials are missing.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, RelayError> {
        let Some((username, password)) = config.credentials() else {
            return Ok(None);
        };
        let recipient = config.recipient().unwrap_or(username);

        let from = parse_mailbox(username)?;
        let to = parse_mailbox(recipient)?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(classify)?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(config.timeout()))
            .build();

        Ok(Some(Self {
            transport,
            from,
            to,
        }))
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    async fn relay(&self, submission: &ContactSubmission) -> Result<(), RelayError> {
        let message = compose(submission, &self.from, &self.to, Utc::now())?;
        let response = self.transport.send(message).await.map_err(classify)?;
        debug!(code = %response.code(), "Relay accepted message");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, RelayError> {
    address
        .parse()
        .map_err(|e| RelayError::Message(format!("invalid address {address:?}: {e}")))
}

/// Map a transport error onto the relay failure categories.
fn classify(err: lettre::transport::smtp::Error) -> RelayError {
    let auth_refused = err
        .status()
        .map(|code| code.to_string())
        .is_some_and(|code| AUTH_FAILURE_CODES.contains(&code.as_str()));

    if auth_refused {
        RelayError::Authentication(err.to_string())
    } else {
        RelayError::Transport(err.to_string())
    }
}

/// Build the notification email for a submission.
pub fn compose(
    submission: &ContactSubmission,
    from: &Mailbox,
    to: &Mailbox,
    received_at: DateTime<Utc>,
) -> Result<Message, RelayError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(format!("Portfolio Contact: {}", submission.name))
        .header(ContentType::TEXT_PLAIN);

    // Replies go straight to the sender when their address is representable.
    match submission.email.parse::<lettre::Address>() {
        Ok(address) => {
            builder = builder.reply_to(Mailbox::new(Some(submission.name.clone()), address));
        }
        Err(e) => warn!(error = %e, "Sender address unusable as Reply-To, omitting"),
    }

    builder
        .body(render_body(submission, received_at))
        .map_err(|e| RelayError::Message(e.to_string()))
}

/// Plain-text body of the notification email.
pub fn render_body(submission: &ContactSubmission, received_at: DateTime<Utc>) -> String {
    format!(
        "New contact form submission\n\
         ==============================\n\
         \n\
         Name:     {name}\n\
         Email:    {email}\n\
         Received: {received}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         ==============================\n\
         Sent from your portfolio website.",
        name = submission.name,
        email = submission.email,
        received = received_at.to_rfc3339(),
        message = submission.message,
    )
}
