// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Serves a single contact form endpoint for a portfolio site:
//!
//! - `POST /contact` validates the submission, applies the per-client
//!   rate limit and relays the message over SMTP
//! - `GET /`, `/health`, `/healthz` report liveness
//! - `GET /metrics` exposes Prometheus metrics
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8000)
//! - `RATE_LIMIT_WINDOW_SECS`: Sliding window length (default: 900)
//! - `RATE_LIMIT_MAX`: Submissions per client per window (default: 5)
//! - `SMTP_EMAIL` / `SMTP_PASSWORD`: Relay account (required to send mail)
//! - `RECIPIENT_EMAIL`: Delivery address (default: `SMTP_EMAIL`)

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    relay::{MailRelay, SmtpRelay},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        max_tracked_keys = config.rate_limit.max_tracked_keys,
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        "Starting contact relay"
    );

    // A broken relay must not take the health endpoints down with it
    let relay: Option<Arc<dyn MailRelay>> = match SmtpRelay::from_config(&config.smtp) {
        Ok(Some(relay)) => Some(Arc::new(relay)),
        Ok(None) => {
            warn!("SMTP_EMAIL and SMTP_PASSWORD are not set, contact submissions will fail");
            None
        }
        Err(e) => {
            error!(error = %e, "Mail relay misconfigured, contact submissions will fail");
            None
        }
    };

    let state = Arc::new(AppState::new(config.clone(), relay)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            cleanup_state.limiter.sweep_expired();
            cleanup_state
                .metrics
                .set_tracked_clients(cleanup_state.limiter.tracked_keys());
        }
    });

    let app = router(state);

    // Start server
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
