//! Structured logging setup for venvwatch
//!
//! Initializes the `tracing` subscriber used by the CLI and by embedders that
//! want the classifier's debug output. Supports console or JSON output and
//! honours `RUST_LOG` when set.
//!
//! # Example
//!
//! ```no_run
//! use venvwatch::util::logging::{init_logging, LoggingConfig};
//! use venvwatch::WatchConfig;
//!
//! let config = WatchConfig::from_env().expect("Invalid configuration");
//! init_logging(LoggingConfig::from_config(&config));
//!
//! tracing::info!("Watching environment creation");
//! ```

use crate::config::WatchConfig;
use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for venvwatch targets
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., venvwatch::venv::classifier) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    /// INFO level, console output, targets on, no location or thread ids
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Level and output format from a loaded [`WatchConfig`]
    ///
    /// CLI overrides are already folded into the config by
    /// [`WatchConfig::load`].
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            level: parse_level(&config.log_level),
            use_json: config.log_json,
            ..Default::default()
        }
    }
}

/// Parses a log level from a string (case-insensitive)
///
/// Unknown values fall back to `Level::INFO` with a warning on stderr.
///
/// ```
/// use venvwatch::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn crate_directive(level: Level) -> Option<Directive> {
    format!("venvwatch={}", level).parse().ok()
}

fn build_filter(level: Level) -> EnvFilter {
    // RUST_LOG takes over completely when present
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let filter = EnvFilter::new("warn");
    match crate_directive(level) {
        Some(directive) => filter.add_directive(directive),
        None => filter,
    }
}

/// Initializes the logging system with the provided configuration
///
/// Only the first call has any effect. Logs go to stderr so stdout stays free
/// for summaries and echoed subprocess output.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        let registry = tracing_subscriber::registry().with(filter);
        // try_init: an embedding application may already own the global subscriber
        let result = if config.use_json {
            registry.with(layer.json()).try_init()
        } else {
            registry.with(layer).try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}
