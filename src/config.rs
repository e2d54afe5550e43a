//! Configuration management for venvwatch
//!
//! Settings are loaded from environment variables with sensible defaults.
//! Command-line flags override whatever is loaded here.
//!
//! # Environment Variables
//!
//! - `VENVWATCH_LOG_LEVEL`: Logging level - default: "info"
//! - `VENVWATCH_LOG_JSON`: Emit logs as JSON (true|false) - default: "false"
//! - `VENVWATCH_TELEMETRY`: Emit telemetry events (true|false) - default: "true"
//! - `VENVWATCH_TELEMETRY_FILE`: Append telemetry as JSON lines to this file - default: unset
//! - `VENVWATCH_CHUNK_CHANNEL_CAPACITY`: Lines buffered between output readers
//!   and the classifier - default: "256"
//!
//! # Example
//!
//! ```no_run
//! use venvwatch::WatchConfig;
//!
//! // `--log-level debug` on the command line
//! let config = WatchConfig::load(Some("debug")).expect("Invalid configuration");
//! assert_eq!(config.log_level, "debug");
//! ```

use crate::pump::{PumpOptions, DEFAULT_CHANNEL_CAPACITY};
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_JSON: bool = false;
const DEFAULT_TELEMETRY_ENABLED: bool = true;
const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Runtime configuration for venvwatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON instead of plain text
    pub log_json: bool,

    /// Emit telemetry events at all
    pub telemetry_enabled: bool,

    /// Optional JSON-lines telemetry output
    pub telemetry_file: Option<PathBuf>,

    /// Bound of the pump's line channel
    pub channel_capacity: usize,
}

fn telemetry_file_from_env() -> Option<PathBuf> {
    env::var("VENVWATCH_TELEMETRY_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: key.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl WatchConfig {
    /// Loads configuration from the environment, rejecting unparseable values
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Loads configuration from the environment with an optional log level
    /// taken from the command line
    ///
    /// When `log_override` is set, `VENVWATCH_LOG_LEVEL` is not consulted.
    pub fn load(log_override: Option<&str>) -> Result<Self, ConfigError> {
        let log_level = match log_override {
            Some(level) => level.to_string(),
            None => env::var("VENVWATCH_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        };

        let config = Self {
            log_level: log_level.trim().to_lowercase(),
            log_json: parse_env("VENVWATCH_LOG_JSON", DEFAULT_LOG_JSON)?,
            telemetry_enabled: parse_env("VENVWATCH_TELEMETRY", DEFAULT_TELEMETRY_ENABLED)?,
            telemetry_file: telemetry_file_from_env(),
            channel_capacity: parse_env(
                "VENVWATCH_CHUNK_CHANNEL_CAPACITY",
                DEFAULT_CHANNEL_CAPACITY,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for an unknown log level or a
    /// channel capacity outside 1..=65536.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "Channel capacity must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::ValidationFailed(format!(
                "Channel capacity cannot exceed {}",
                MAX_CHANNEL_CAPACITY
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Pump settings derived from this configuration
    pub fn pump_options(&self, echo: bool) -> PumpOptions {
        PumpOptions {
            channel_capacity: self.channel_capacity,
            echo,
        }
    }
}
