//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::limits::LimitsConfig;

/// Placeholder token secret shipped in sample configs.
pub const DEFAULT_TOKEN_SECRET: &str = "changeme";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Storage backend.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Bearer token verification.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Queue capacities and timeouts.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in logs.
    pub name: String,
    /// Port of the Prometheus `/metrics` endpoint. `0` disables it.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

/// Which [`crate::store::RoomStore`] backs the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    /// Volatile in-process store; everything is lost on restart.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "sputnikd.db".to_string()
}

/// Token verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 key shared with the token issuer.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
        }
    }
}

fn default_token_secret() -> String {
    DEFAULT_TOKEN_SECRET.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            name = "sputnik.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.metrics_port, 9090);
        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
        assert_eq!(config.database.path, "sputnikd.db");
        assert_eq!(config.auth.token_secret, DEFAULT_TOKEN_SECRET);
        assert_eq!(config.limits.default_event_limit, 50);
    }

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            name = "sputnik.test"
            metrics_port = 0

            [database]
            backend = "memory"

            [auth]
            token_secret = "a-much-longer-secret-value"

            [limits]
            room_mailbox_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.server.metrics_port, 0);
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.limits.room_mailbox_capacity, 8);
        assert_eq!(config.limits.subscriber_queue_capacity, 64);
    }

    #[test]
    fn missing_server_section_is_a_parse_error() {
        let err = toml::from_str::<Config>("[database]\npath = \"x.db\"").unwrap_err();
        assert!(err.to_string().contains("server"));
    }

    #[test]
    fn load_reports_io_errors() {
        let err = Config::load("/nonexistent/sputnikd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
