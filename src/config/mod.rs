//! Configuration management for mediasync
//!
//! Layered configuration loaded from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use mediasync::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Operator API on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Overrides use the pattern `MEDIASYNC__<section>__<key>`:
//! - `MEDIASYNC__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `MEDIASYNC__WORKER__CONCURRENCY=8`
//! - `MEDIASYNC__PROVIDER__CONTENT_HOST=lh3.googleusercontent.com`
//!
//! The secret encryption key is only read from `MEDIASYNC_SECRET_KEY`.
//!
//! # Configuration File
//!
//! Defaults to `config/mediasync.toml`; override with `MEDIASYNC_CONFIG`.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, ProviderConfig, RetryConfig, SecretsConfig, ServerConfig, TelemetryConfig,
    WorkerConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`MEDIASYNC__*`)
    /// 2. TOML file (default: `config/mediasync.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides and secrets
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_with_path(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
