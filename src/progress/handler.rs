//! Progress reporter trait and updates

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Stage of environment creation shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressMessage {
    /// The virtual environment exists (freshly created or reused)
    VenvCreated,

    /// pip inside the environment is being upgraded
    UpgradingPip,

    /// Project dependencies are being installed
    InstallingPackages,
}

impl ProgressMessage {
    /// Human-readable text for the stage
    pub fn text(self) -> &'static str {
        match self {
            ProgressMessage::VenvCreated => "Created virtual environment",
            ProgressMessage::UpgradingPip => "Upgrading pip...",
            ProgressMessage::InstallingPackages => "Installing packages...",
        }
    }
}

impl fmt::Display for ProgressMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Update sent to a progress reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub message: ProgressMessage,
}

impl ProgressUpdate {
    pub const fn new(message: ProgressMessage) -> Self {
        Self { message }
    }
}

/// Trait for handling progress updates during environment creation
pub trait ProgressReporter: Send + Sync {
    /// Called when the run reaches a new stage
    fn report(&self, update: &ProgressUpdate);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn report(&self, update: &ProgressUpdate) {
        (**self).report(update)
    }
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Box<T> {
    fn report(&self, update: &ProgressUpdate) {
        (**self).report(update)
    }
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for &T {
    fn report(&self, update: &ProgressUpdate) {
        (**self).report(update)
    }
}

/// No-op reporter that ignores all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {
    fn report(&self, _update: &ProgressUpdate) {
        // Intentionally empty
    }
}

/// Reporter that prints each stage as a line of text
///
/// Used by the CLI to echo stages to stderr while the subprocess runs.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write + Send> {
    writer: Mutex<W>,
}

impl ConsoleReporter<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressReporter for ConsoleReporter<W> {
    fn report(&self, update: &ProgressUpdate) {
        if let Ok(mut writer) = self.writer.lock() {
            // Terminal output is best effort
            let _ = writeln!(writer, "==> {}", update.message);
        }
    }
}
