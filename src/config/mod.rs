//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, DatabaseConfig, AuthConfig)
//! - [`limits`]: Mailbox, queue, timeout and sync limits (LimitsConfig)

mod limits;
mod types;

pub use limits::LimitsConfig;
pub use types::{
    AuthConfig, Config, ConfigError, DEFAULT_TOKEN_SECRET, DatabaseBackend, DatabaseConfig,
    ServerConfig,
};
