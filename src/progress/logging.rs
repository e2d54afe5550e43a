//! Logging-based progress reporter

use super::{ProgressMessage, ProgressReporter, ProgressUpdate};
use tracing::info;

/// Reporter that logs progress updates using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReporter;

impl ProgressReporter for LoggingReporter {
    fn report(&self, update: &ProgressUpdate) {
        match update.message {
            ProgressMessage::VenvCreated => {
                info!(stage = "created", "{}", update.message);
            }
            ProgressMessage::UpgradingPip => {
                info!(stage = "upgrading_pip", "{}", update.message);
            }
            ProgressMessage::InstallingPackages => {
                info!(stage = "installing_packages", "{}", update.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_all_messages() {
        let reporter = LoggingReporter;

        // Every message kind should log without panicking
        for message in [
            ProgressMessage::VenvCreated,
            ProgressMessage::UpgradingPip,
            ProgressMessage::InstallingPackages,
        ] {
            reporter.report(&ProgressUpdate::new(message));
        }
    }
}
