use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, error};

use crate::sync::SyncSettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Frames buffered per relay channel before slow members start lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Typing indicators expire after this long without a refresh
    #[serde(default = "default_presence_timeout_ms")]
    pub presence_timeout_ms: u64,

    /// Minimum spacing between two outgoing typing signals
    #[serde(default = "default_typing_throttle_ms")]
    pub typing_throttle_ms: i64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Tracing filter used when `RUST_LOG` is not set; `log_level` applies to this crate
    pub fn log_filter(&self) -> String {
        format!("nexus_sync={},tower_http=debug,axum::rejection=trace,info", self.log_level)
    }

    /// Origins allowed by CORS, empty when unset
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            presence_timeout: Duration::from_millis(self.presence_timeout_ms),
            typing_throttle_ms: self.typing_throttle_ms,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            channel_capacity: default_channel_capacity(),
            presence_timeout_ms: default_presence_timeout_ms(),
            typing_throttle_ms: default_typing_throttle_ms(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "nexus-sync".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_channel_capacity() -> usize {
    64
}

fn default_presence_timeout_ms() -> u64 {
    3000
}

fn default_typing_throttle_ms() -> i64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sync_contract() {
        let config = Config::default();
        let settings = config.sync_settings();
        assert_eq!(settings.presence_timeout, Duration::from_millis(3000));
        assert_eq!(settings.typing_throttle_ms, 500);
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert!(config.is_development());
    }

    #[test]
    fn env_values_override_defaults() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("PRESENCE_TIMEOUT_MS".to_string(), "1500".to_string()),
            ("CORS_ORIGINS".to_string(), "http://localhost:5173, https://nexus.example".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.presence_timeout_ms, 1500);
        assert_eq!(config.typing_throttle_ms, 500);
        assert_eq!(config.allowed_origins(), vec!["http://localhost:5173", "https://nexus.example"]);
    }

    #[test]
    fn log_level_sets_crate_filter() {
        let vars = vec![("LOG_LEVEL".to_string(), "trace".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.log_filter(), "nexus_sync=trace,tower_http=debug,axum::rejection=trace,info");
        assert!(Config::default().log_filter().starts_with("nexus_sync=info,"));
    }
}
