// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay service.
//!
//! Every knob can be set through the environment (a `.env` file is honoured
//! by `main`). Values are read once at startup and never change afterwards.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Invalid bind address {0:?}")]
    InvalidBindAddr(String),

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Invalid metrics path {0:?}: must start with '/' and not shadow another route")]
    InvalidMetricsPath(String),

    #[error("Invalid length bounds for {field}: min {min} exceeds max {max}")]
    InvalidBounds {
        field: &'static str,
        min: usize,
        max: usize,
    },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Admission control configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Contact form validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Outgoing mail configuration
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the trailing window in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Submissions admitted per client inside one window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Upper bound on tracked clients, 0 disables the cap (default: 10000)
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: usize,

    /// Interval between background sweeps of idle clients (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Field length limits for contact submissions, counted in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min")]
    pub name_min_chars: usize,

    #[serde(default = "default_name_max")]
    pub name_max_chars: usize,

    #[serde(default = "default_message_min")]
    pub message_min_chars: usize,

    #[serde(default = "default_message_max")]
    pub message_max_chars: usize,
}

/// SMTP relay configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host (default: smtp.gmail.com)
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port (default: 465, implicit TLS)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Upgrade a plaintext connection with STARTTLS instead of implicit TLS
    #[serde(default)]
    pub starttls: bool,

    /// Command timeout in seconds (default: 30)
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,

    /// Account used to authenticate and as the From address
    #[serde(default)]
    pub username: Option<String>,

    /// Account password (an app password for Gmail)
    #[serde(default)]
    pub password: Option<String>,

    /// Where submissions are delivered (defaults to the account address)
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Cross-origin resource sharing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; a `*` entry allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    5
}

fn default_max_tracked_keys() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_name_min() -> usize {
    2
}

fn default_name_max() -> usize {
    100
}

fn default_message_min() -> usize {
    10
}

fn default_message_max() -> usize {
    5000
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://localhost:3000",
        "http://127.0.0.1:5173",
        "*",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

/// Paths served regardless of configuration.
const RESERVED_PATHS: &[&str] = &["/", "/health", "/healthz", "/contact"];

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            smtp: SmtpConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            max_tracked_keys: default_max_tracked_keys(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_chars: default_name_min(),
            name_max_chars: default_name_max(),
            message_min_chars: default_message_min(),
            message_max_chars: default_message_max(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            starttls: false,
            timeout_secs: default_smtp_timeout_secs(),
            username: None,
            password: None,
            recipient: None,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("timeout_secs", &self.timeout_secs)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the sliding window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl SmtpConfig {
    /// Account credentials, present only when both halves are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|s| !s.trim().is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((username, password))
    }

    /// Delivery address, falling back to the account address.
    pub fn recipient(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.username.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config = Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit: RateLimitConfig {
                window_secs: parse_var(&var, "RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs)?,
                max_requests: parse_var(&var, "RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?,
                max_tracked_keys: parse_var(&var, "RATE_LIMIT_MAX_KEYS", defaults.rate_limit.max_tracked_keys)?,
                sweep_interval_secs: parse_var(&var, "RATE_LIMIT_SWEEP_SECS", defaults.rate_limit.sweep_interval_secs)?,
            },
            validation: defaults.validation,
            smtp: SmtpConfig {
                host: var("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: parse_var(&var, "SMTP_PORT", defaults.smtp.port)?,
                starttls: parse_var(&var, "SMTP_STARTTLS", defaults.smtp.starttls)?,
                timeout_secs: parse_var(&var, "SMTP_TIMEOUT_SECS", defaults.smtp.timeout_secs)?,
                username: var("SMTP_EMAIL"),
                password: var("SMTP_PASSWORD"),
                recipient: var("RECIPIENT_EMAIL"),
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or(defaults.cors.allowed_origins),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&var, "METRICS_ENABLED", defaults.metrics.enabled)?,
                path: var("METRICS_PATH").unwrap_or(defaults.metrics.path),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::MustBePositive("RATE_LIMIT_WINDOW_SECS"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::MustBePositive("RATE_LIMIT_MAX"));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(ConfigError::MustBePositive("RATE_LIMIT_SWEEP_SECS"));
        }

        if self.metrics.enabled {
            let path = &self.metrics.path;
            if !path.starts_with('/') || RESERVED_PATHS.contains(&path.as_str()) {
                return Err(ConfigError::InvalidMetricsPath(path.clone()));
            }
        }

        let v = &self.validation;
        if v.name_min_chars > v.name_max_chars {
            return Err(ConfigError::InvalidBounds {
                field: "name",
                min: v.name_min_chars,
                max: v.name_max_chars,
            });
        }
        if v.message_min_chars > v.message_max_chars {
            return Err(ConfigError::InvalidBounds {
                field: "message",
                min: v.message_min_chars,
                max: v.message_max_chars,
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind_addr.clone()))
    }
}

fn parse_var<T, F>(lookup: F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name,
            value: raw,
        }),
        None => Ok(default),
    }
}
