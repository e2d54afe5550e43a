//! Utility modules for venvwatch

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
