//! Configuration management for the siesta sleep webhook service.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use siesta_dispatch::{BookingClientConfig, DispatchConfig, DEFAULT_MAX_CONCURRENCY};

const CONFIG_FILE: &str = "config.toml";

/// Deployment environment of the health-data provider integration.
///
/// Controls whether error responses include diagnostic stack detail:
/// production responses carry the message only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Sandbox integration, verbose error responses.
    Sandbox,
    /// Production integration, error messages only.
    Production,
}

impl Environment {
    /// True when running against the production provider environment.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The service works out-of-the-box except for the webhook signing secret,
/// which has no safe default and must be provided.
///
/// # Example
///
/// ```no_run
/// use siesta_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Provider
    /// Secret used to verify inbound webhook signatures, either
    /// `whsec_<base64>` or a raw byte string.
    ///
    /// Environment variable: `VITAL_WEBHOOK_SECRET`
    #[serde(default, alias = "VITAL_WEBHOOK_SECRET", alias = "vital_webhook_secret")]
    pub webhook_secret: String,
    /// Provider environment, `sandbox` or `production`.
    ///
    /// Environment variable: `VITAL_ENVIRONMENT`
    #[serde(default = "default_environment", alias = "VITAL_ENVIRONMENT", alias = "vital_environment")]
    pub environment: Environment,

    // Booking API
    /// Base URL of the booking platform API.
    ///
    /// Environment variable: `BOOKING_API_URL`
    #[serde(default = "default_booking_api_url", alias = "BOOKING_API_URL")]
    pub booking_api_url: String,
    /// Bearer token for the booking platform API.
    ///
    /// Environment variable: `BOOKING_API_TOKEN`
    #[serde(default, alias = "BOOKING_API_TOKEN")]
    pub booking_api_token: String,

    // Reschedule dispatch
    /// Human-readable reason attached to every triggered reschedule.
    ///
    /// Environment variable: `RESCHEDULE_REASON`
    #[serde(default = "default_reschedule_reason", alias = "RESCHEDULE_REASON")]
    pub reschedule_reason: String,
    /// Maximum concurrent reschedule calls per webhook event.
    ///
    /// Environment variable: `RESCHEDULE_MAX_CONCURRENCY`
    #[serde(default = "default_reschedule_concurrency", alias = "RESCHEDULE_MAX_CONCURRENCY")]
    pub reschedule_max_concurrency: usize,
    /// HTTP timeout for each booking API call in seconds.
    ///
    /// Environment variable: `RESCHEDULE_TIMEOUT_SECONDS`
    #[serde(default = "default_reschedule_timeout", alias = "RESCHEDULE_TIMEOUT_SECONDS")]
    pub reschedule_timeout_seconds: u64,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (e.g., `VITAL_WEBHOOK_SECRET`, `PORT`)
    /// 2. Configuration file (`config.toml`)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the dispatch crate's concurrency configuration.
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig { max_concurrency: self.reschedule_max_concurrency }
    }

    /// Convert to the booking API client configuration.
    pub fn to_booking_client_config(&self) -> BookingClientConfig {
        BookingClientConfig {
            base_url: self.booking_api_url.clone(),
            api_token: self.booking_api_token.clone(),
            timeout: Duration::from_secs(self.reschedule_timeout_seconds),
            user_agent: "Siesta-Reschedule/1.0".to_string(),
        }
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Get the webhook secret masked for logging.
    pub fn webhook_secret_masked(&self) -> String {
        if self.webhook_secret.is_empty() {
            "(unset)".to_string()
        } else if self.webhook_secret.starts_with("whsec_") {
            "whsec_***".to_string()
        } else {
            "***".to_string()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.webhook_secret.is_empty() {
            anyhow::bail!("webhook signing secret must be set (VITAL_WEBHOOK_SECRET)");
        }

        if self.booking_api_url.is_empty() {
            anyhow::bail!("booking API url must be set (BOOKING_API_URL)");
        }

        if self.reschedule_max_concurrency == 0 {
            anyhow::bail!("reschedule_max_concurrency must be greater than 0");
        }

        if self.reschedule_timeout_seconds == 0 {
            anyhow::bail!("reschedule_timeout_seconds must be greater than 0");
        }

        if self.reschedule_reason.trim().is_empty() {
            anyhow::bail!("reschedule_reason must not be blank");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            webhook_secret: String::new(),
            environment: default_environment(),
            booking_api_url: default_booking_api_url(),
            booking_api_token: String::new(),
            reschedule_reason: default_reschedule_reason(),
            reschedule_max_concurrency: default_reschedule_concurrency(),
            reschedule_timeout_seconds: default_reschedule_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_environment() -> Environment {
    Environment::Sandbox
}

fn default_booking_api_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

fn default_reschedule_reason() -> String {
    "Can't do it".to_string()
}

fn default_reschedule_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_reschedule_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
