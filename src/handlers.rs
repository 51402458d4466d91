// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! A submission is validated, then charged against the sender's budget, then
//! handed to the mail relay. Invalid submissions never touch limiter state.

use crate::config::{Config, CorsConfig};
use crate::error::{AppError, Result};
use crate::limiter::{Decision, RateLimiter};
use crate::metrics::{outcome, Metrics};
use crate::relay::MailRelay;
use crate::validator::{ContactRequest, ContactValidator};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Key used when the peer address is not available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: ContactValidator,
    pub relay: Option<Arc<dyn MailRelay>>,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, relay: Option<Arc<dyn MailRelay>>) -> prometheus::Result<Self> {
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: ContactValidator::new(config.validation.clone()),
            relay,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Successful submission response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app: Router<Arc<AppState>> = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(contact));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cross-origin policy for browser submissions.
///
/// A `*` origin allows any site without credentials; otherwise only the
/// listed origins are allowed and credentials are permitted.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::POST]);

    if config.allowed_origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Contact API is running.",
        service: "contact-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String> {
    state
        .metrics
        .set_tracked_clients(state.limiter.tracked_keys());
    Ok(state.metrics.render()?)
}

/// Rate-limit key for a connection: the peer IP, with IPv4-mapped IPv6
/// addresses folded to IPv4.
pub fn client_key(connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_canonical().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Accept a contact form submission and relay it by email.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: std::result::Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    let client = client_key(connect_info.as_ref());

    let Json(request) = payload.map_err(|rejection| {
        info!(client = %client, error = %rejection.body_text(), "Malformed contact body");
        state.metrics.record(outcome::INVALID);
        AppError::MalformedBody {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    })?;

    let submission = state.validator.validate(&request).map_err(|err| {
        info!(client = %client, field = err.field(), error = %err, "Validation failed");
        state.metrics.record(outcome::INVALID);
        AppError::from(err)
    })?;

    if let Decision::Reject { retry_after } = state.limiter.check(&client) {
        info!(
            client = %client,
            retry_after_secs = retry_after.as_secs(),
            "Submission rate limited"
        );
        state.metrics.record(outcome::RATE_LIMITED);
        return Err(AppError::RateLimited { retry_after });
    }

    let Some(relay) = state.relay.as_ref() else {
        error!(client = %client, "Mail relay is not configured, rejecting submission");
        state.metrics.record(outcome::RELAY_UNCONFIGURED);
        return Err(AppError::RelayUnavailable);
    };

    if let Err(err) = relay.relay(&submission).await {
        error!(client = %client, kind = err.kind(), error = %err, "Mail relay failed");
        state.metrics.record(outcome::RELAY_FAILED);
        return Err(AppError::Relay(err));
    }

    debug!(client = %client, "Submission relayed");
    state.metrics.record(outcome::SENT);

    Ok(Json(ContactResponse {
        status: "success",
        message: "Your message has been sent! I'll get back to you soon.",
    }))
}
