//! Progress reporting for environment creation

mod handler;
mod logging;

pub use handler::{ConsoleReporter, NoOpReporter, ProgressMessage, ProgressReporter, ProgressUpdate};
pub use logging::LoggingReporter;
