//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use agora_webhooks::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_TIMEOUT_SECS, WebhookConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "AGORA_CONFIG";

/// Configuration file used when `AGORA_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "agora.toml";

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Bearer token for the admin API. Unset leaves it open.
    pub admin_secret: Option<String>,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            admin_secret: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Address to bind, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Per-delivery timeout in seconds.
    pub timeout_secs: u64,
    /// Consecutive failures before a subscription is disabled.
    pub failure_threshold: u32,
    /// Shared secret for signed inbound events. Unset rejects all inbound requests.
    pub inbound_secret: Option<String>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            inbound_secret: None,
        }
    }
}

impl WebhookSettings {
    /// Converts into the dispatcher configuration.
    pub fn to_webhook_config(&self) -> WebhookConfig {
        WebhookConfig::new()
            .timeout(Duration::from_secs(self.timeout_secs))
            .failure_threshold(self.failure_threshold)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhooks: WebhookSettings,
}

impl AppConfig {
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhooks.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "webhooks.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.webhooks.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "webhooks.failure_threshold must be greater than zero".to_string(),
            ));
        }
        check_secret("server.admin_secret", self.server.admin_secret.as_deref())?;
        check_secret("webhooks.inbound_secret", self.webhooks.inbound_secret.as_deref())?;
        Ok(())
    }
}

/// A configured secret must not be blank.
fn check_secret(key: &str, secret: Option<&str>) -> Result<(), ConfigError> {
    match secret {
        Some(secret) if secret.trim().is_empty() => Err(ConfigError::Invalid(format!(
            "{key} must not be empty; remove it to disable"
        ))),
        _ => Ok(()),
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file. A missing file yields defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Loads configuration from `AGORA_CONFIG`, falling back to `agora.toml`.
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
