//! Configuration management for storydesk
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use storydesk::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `STORYDESK__<section>__<key>`
//!
//! Examples:
//! - `STORYDESK__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `STORYDESK__SCHEDULE__UTC_OFFSET=-03:00`
//! - `STORYDESK__WORKER__STALE_PROCESSING_AFTER=30m`
//!
//! The API bearer token is only read from `STORYDESK_API_TOKEN`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/storydesk.toml`.
//! This can be overridden using the `STORYDESK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    AuthConfig, Config, PlatformConfig, ScheduleConfig, ServerConfig, StorageConfig,
    TelemetryConfig, WorkerSettings, parse_utc_offset,
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
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (bad offset, non-http URLs, zero limits).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path (`--config`)
    ///
    /// Environment overrides and `STORYDESK_API_TOKEN` still apply.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_with_secrets(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[schedule]\nutc_offset = \"-03:00\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.schedule.utc_offset, "-03:00");
        assert_eq!(config.platform.graph_url, "https://graph.facebook.com");
    }

    #[test]
    fn test_validation_rejects_bad_offset() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[schedule]\nutc_offset = \"BRT\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidUtcOffset(_))
        ));
    }

    #[test]
    fn test_effective_config_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("effective.toml");

        let mut config = Config::default();
        config.schedule.utc_offset = "-03:00".to_string();
        config.worker.stale_processing_after = HumanDuration::from_secs(30 * 60);
        fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from_path(config_path).unwrap();
        assert_eq!(loaded.schedule.utc_offset, "-03:00");
        assert_eq!(loaded.worker.stale_processing_after.as_duration().as_secs(), 1800);
        assert_eq!(loaded.storage.max_upload_bytes, config.storage.max_upload_bytes);
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server\nbind_addr = ").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
