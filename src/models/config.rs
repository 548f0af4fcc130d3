//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "OUTAGE_SYNC_API_KEY";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry and backoff settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Sync run settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write this configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(AppError::validation(format!(
                "api.api_key is empty (set it in the config file or {API_KEY_ENV})"
            )));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        Url::parse(&self.api.base_url).map_err(|e| {
            AppError::validation(format!("api.base_url '{}' is invalid: {e}", self.api.base_url))
        })?;
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.retry.max_retries == 0 {
            return Err(AppError::validation("retry.max_retries must be > 0"));
        }
        if self.sync.site_id.trim().is_empty() {
            return Err(AppError::validation("sync.site_id is empty"));
        }
        Ok(())
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Value of the `x-api-key` header
    #[serde(default)]
    pub api_key: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            api_key: String::new(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per request, including the first
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles on every attempt
    #[serde(default = "defaults::backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            backoff_base_ms: defaults::backoff_base_ms(),
        }
    }
}

/// Sync run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Site whose outages are synced
    #[serde(default = "defaults::site_id")]
    pub site_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            site_id: defaults::site_id(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "https://api.krakenflex.systems/interview-tests-mock-api/v1".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        concat!("outage-sync/", env!("CARGO_PKG_VERSION")).into()
    }

    // Retry defaults
    pub fn max_retries() -> u32 {
        5
    }
    pub fn backoff_base_ms() -> u64 {
        500
    }

    // Sync defaults
    pub fn site_id() -> String {
        "norwich-pear-tree".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
