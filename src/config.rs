//! WolfHA Configuration
//!
//! This module provides configuration structures for the WolfHA
//! replication setup tool.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main WolfHA configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WolfHaConfig {
    /// Platform API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Replication form defaults
    #[serde(default)]
    pub form: FormConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the platform API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Defaults used when no HA configuration exists yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Address this instance registers with (defaults to the API endpoint origin)
    #[serde(default)]
    pub default_instance_address: Option<String>,

    /// Replication frequency in minutes
    #[serde(default = "default_frequency_minutes")]
    pub default_replication_frequency_minutes: i64,

    /// Start the replication schedule after creating an Active instance
    #[serde(default = "default_true")]
    pub default_replication_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_frequency_minutes() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_instance_address: None,
            default_replication_frequency_minutes: default_frequency_minutes(),
            default_replication_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WolfHaConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: WolfHaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        let endpoint = self.api.endpoint.to_ascii_lowercase();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(crate::Error::Config(
                "api.endpoint must be an http:// or https:// URL".into(),
            ));
        }

        if self.form.default_replication_frequency_minutes < 1 {
            return Err(crate::Error::Config(
                "form.default_replication_frequency_minutes must be at least 1".into(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(crate::Error::Config(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Endpoint without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.api.endpoint.trim_end_matches('/')
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Address a new instance registers with when the operator gives none.
    ///
    /// Falls back to the scheme and authority of the API endpoint.
    pub fn default_instance_address(&self) -> String {
        if let Some(addr) = &self.form.default_instance_address {
            return addr.clone();
        }

        let endpoint = self.endpoint();
        match endpoint.split_once("://") {
            Some((scheme, rest)) => {
                let authority = rest.split('/').next().unwrap_or(rest);
                format!("{}://{}", scheme, authority)
            }
            None => endpoint.to_string(),
        }
    }
}
