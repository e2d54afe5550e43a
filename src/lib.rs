//! venvwatch - progress and telemetry for Python venv creation
//!
//! A venv creation script announces each lifecycle step by printing a sentinel
//! marker (`CREATED_VENV:`, `CREATE_VENV.UPGRADING_PIP`, ...). This crate
//! watches that output and turns the first occurrence of each kind of marker
//! into a user-facing progress update and a structured telemetry event, while
//! remembering the last failure marker for the final report.
//!
//! # Example Usage
//!
//! ```
//! use venvwatch::{LoggingReporter, Marker, MarkerClassifier, MemorySink};
//!
//! let mut classifier = MarkerClassifier::new(LoggingReporter, MemorySink::new());
//!
//! classifier.process("CREATED_VENV:/home/user/project/.venv/bin/python\n");
//! classifier.process("CREATE_VENV.PIP_FAILED_INSTALL_REQUIREMENTS\n");
//!
//! assert_eq!(classifier.telemetry().len(), 2);
//! assert_eq!(classifier.last_error(), Some(Marker::InstallRequirementsFailed));
//! ```
//!
//! # Project Structure
//!
//! - [`venv`]: marker vocabulary and the classifier
//! - [`progress`]: progress reporter trait and reporters
//! - [`telemetry`]: telemetry events and sinks
//! - [`pump`]: feeding files, stdin or a live subprocess into a classifier
//! - [`cli`]: the `venvwatch` command line

pub mod cli;
pub mod config;
pub mod progress;
pub mod pump;
pub mod telemetry;
pub mod util;
pub mod venv;

pub use config::{ConfigError, WatchConfig};
pub use progress::{
    ConsoleReporter, LoggingReporter, NoOpReporter, ProgressMessage, ProgressReporter,
    ProgressUpdate,
};
pub use pump::{feed_reader, run_command, PumpError, PumpOptions, RunOutcome};
pub use telemetry::{
    EventName, InstallSource, JsonLinesSink, LoggingSink, MemorySink, MultiSink, NoOpSink, Reason,
    TelemetryEvent, TelemetrySink,
};
pub use util::{init_logging, LoggingConfig};
pub use venv::{Category, ErrorKind, Marker, MarkerClassifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
