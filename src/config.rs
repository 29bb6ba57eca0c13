//! Local agent configuration.
//!
//! The monitored service ships a TOML file describing how the embedded
//! agent should behave; individual keys can be overridden through
//! environment variables with the `WATCHTOWER__` prefix. Every capture
//! toggle defaults to enabled so an empty file yields a fully working
//! agent.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

/// Toggles for the error collector.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorCollectorConfig {
    /// Whether error records are captured at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether sampled error events are emitted alongside records.
    #[serde(default = "default_true")]
    pub capture_events: bool,
}

impl Default for ErrorCollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture_events: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Local configuration snapshot for the embedded agent.
///
/// Transactions take an immutable snapshot of this at creation time; the
/// remote policy received at connect time is layered on top per
/// notification (see [`crate::policy`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    /// Name the monitored application reports under.
    #[serde(default)]
    pub app_name: String,
    /// High security mode: error messages are redacted before recording.
    #[serde(default)]
    pub high_security: bool,
    /// Error collector toggles.
    #[serde(default)]
    pub error_collector: ErrorCollectorConfig,
}

/// Errors that can occur when loading agent configuration.
#[derive(Debug, Error)]
pub enum AgentConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ConfigError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),
}

impl AgentConfig {
    /// Load agent configuration from a TOML file.
    ///
    /// Environment variables override file values using the format
    /// `WATCHTOWER__<SECTION>__<KEY>`
    /// (e.g. `WATCHTOWER__ERROR_COLLECTOR__ENABLED=false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be parsed, or
    /// the path is not valid UTF-8.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AgentConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| AgentConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(AgentConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(
                Environment::with_prefix("WATCHTOWER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
