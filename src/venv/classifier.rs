//! Marker classifier for venv creation output
//!
//! [`MarkerClassifier`] receives chunks of the creation script's output and
//! turns the first occurrence of each marker category into a progress update
//! and a telemetry event. Rules are evaluated in a fixed order and at most one
//! rule fires per chunk, which matches the one-marker-per-line cadence of the
//! script.

use super::markers::Marker;
use crate::progress::{ProgressMessage, ProgressReporter, ProgressUpdate};
use crate::telemetry::{EventName, InstallSource, Reason, TelemetryEvent, TelemetrySink};
use serde::Serialize;
use tracing::{debug, trace};

/// Group of markers sharing a single "already reported" flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Created,
    ToolingMissing,
    UpgradingPip,
    CreationFailed,
    InstallingPackages,
    InstallingPackagesFailed,
    UpgradedPip,
    InstalledPackages,
}

impl Category {
    pub const COUNT: usize = 8;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Created,
        Category::ToolingMissing,
        Category::UpgradingPip,
        Category::CreationFailed,
        Category::InstallingPackages,
        Category::InstallingPackagesFailed,
        Category::UpgradedPip,
        Category::InstalledPackages,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One entry of the ordered rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub marker: Marker,
    pub category: Category,
    pub progress: Option<ProgressMessage>,
    pub event: TelemetryEvent,
}

impl Rule {
    const fn new(
        marker: Marker,
        category: Category,
        progress: Option<ProgressMessage>,
        event: TelemetryEvent,
    ) -> Self {
        Self {
            marker,
            category,
            progress,
            event,
        }
    }

    /// Whether firing this rule overwrites the last error
    pub fn records_error(&self) -> bool {
        self.marker.is_error()
    }
}

/// Rules in precedence order; the first eligible match wins
pub static RULES: [Rule; 14] = [
    Rule::new(
        Marker::VenvCreated,
        Category::Created,
        Some(ProgressMessage::VenvCreated),
        TelemetryEvent::venv_reason(EventName::EnvironmentCreated, Reason::Created),
    ),
    Rule::new(
        Marker::VenvExisting,
        Category::Created,
        Some(ProgressMessage::VenvCreated),
        TelemetryEvent::venv_reason(EventName::EnvironmentCreated, Reason::Existing),
    ),
    Rule::new(
        Marker::VenvNotInstalled,
        Category::ToolingMissing,
        None,
        TelemetryEvent::venv_reason(EventName::EnvironmentFailed, Reason::NoVenv),
    ),
    Rule::new(
        Marker::PipNotInstalled,
        Category::ToolingMissing,
        None,
        TelemetryEvent::venv_reason(EventName::EnvironmentFailed, Reason::NoPip),
    ),
    Rule::new(
        Marker::UpgradingPip,
        Category::UpgradingPip,
        Some(ProgressMessage::UpgradingPip),
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackages,
            InstallSource::PipUpgrade,
        ),
    ),
    Rule::new(
        Marker::CreateVenvFailed,
        Category::CreationFailed,
        None,
        TelemetryEvent::venv_reason(EventName::EnvironmentFailed, Reason::Other),
    ),
    Rule::new(
        Marker::InstallingRequirements,
        Category::InstallingPackages,
        Some(ProgressMessage::InstallingPackages),
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackages,
            InstallSource::Requirements,
        ),
    ),
    Rule::new(
        Marker::InstallingPyproject,
        Category::InstallingPackages,
        Some(ProgressMessage::InstallingPackages),
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackages,
            InstallSource::Pyproject,
        ),
    ),
    Rule::new(
        Marker::UpgradePipFailed,
        Category::InstallingPackagesFailed,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackagesFailed,
            InstallSource::PipUpgrade,
        ),
    ),
    Rule::new(
        Marker::InstallRequirementsFailed,
        Category::InstallingPackagesFailed,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackagesFailed,
            InstallSource::Requirements,
        ),
    ),
    Rule::new(
        Marker::InstallPyprojectFailed,
        Category::InstallingPackagesFailed,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstallingPackagesFailed,
            InstallSource::Pyproject,
        ),
    ),
    Rule::new(
        Marker::UpgradedPip,
        Category::UpgradedPip,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstalledPackages,
            InstallSource::PipUpgrade,
        ),
    ),
    Rule::new(
        Marker::InstalledRequirements,
        Category::InstalledPackages,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstalledPackages,
            InstallSource::Requirements,
        ),
    ),
    Rule::new(
        Marker::InstalledPyproject,
        Category::InstalledPackages,
        None,
        TelemetryEvent::venv_using(
            EventName::EnvironmentInstalledPackages,
            InstallSource::Pyproject,
        ),
    ),
];

/// Streaming classifier for one environment-creation run
///
/// Not meant to be reused: create a new instance per run.
pub struct MarkerClassifier<P, T> {
    progress: P,
    telemetry: T,
    reported: [bool; Category::COUNT],
    last_error: Option<Marker>,
}

impl<P: ProgressReporter, T: TelemetrySink> MarkerClassifier<P, T> {
    pub fn new(progress: P, telemetry: T) -> Self {
        Self {
            progress,
            telemetry,
            reported: [false; Category::COUNT],
            last_error: None,
        }
    }

    /// Feeds one chunk of subprocess output
    ///
    /// Returns the marker whose rule fired, if any. Chunks without an
    /// unreported marker are ignored.
    pub fn process(&mut self, chunk: &str) -> Option<Marker> {
        let rule = RULES
            .iter()
            .find(|rule| !self.reported[rule.category.index()] && rule.marker.found_in(chunk));

        let Some(rule) = rule else {
            trace!(len = chunk.len(), "No unreported marker in chunk");
            return None;
        };

        self.fire(rule);
        Some(rule.marker)
    }

    fn fire(&mut self, rule: &Rule) {
        self.reported[rule.category.index()] = true;

        debug!(
            marker = %rule.marker,
            category = ?rule.category,
            event = %rule.event.name,
            "Marker detected"
        );

        if let Some(message) = rule.progress {
            self.progress.report(&ProgressUpdate::new(message));
        }
        self.telemetry.emit(&rule.event);

        if rule.records_error() {
            self.last_error = Some(rule.marker);
        }
    }

    /// Most recently recorded error marker, or `None` if no error was seen
    pub fn last_error(&self) -> Option<Marker> {
        self.last_error
    }

    pub fn has_reported(&self, category: Category) -> bool {
        self.reported[category.index()]
    }

    /// Categories that have fired, in rule-table order
    pub fn fired(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(move |category| self.has_reported(*category))
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

impl<P, T> std::fmt::Debug for MarkerClassifier<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerClassifier")
            .field("reported", &self.reported)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingReporter {
        updates: Mutex<Vec<ProgressMessage>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, update: &ProgressUpdate) {
            self.updates.lock().unwrap().push(update.message);
        }
    }

    fn classifier() -> (
        MarkerClassifier<Arc<RecordingReporter>, Arc<MemorySink>>,
        Arc<RecordingReporter>,
        Arc<MemorySink>,
    ) {
        let progress = Arc::new(RecordingReporter::default());
        let telemetry = Arc::new(MemorySink::new());
        (
            MarkerClassifier::new(progress.clone(), telemetry.clone()),
            progress,
            telemetry,
        )
    }

    #[test]
    fn test_rule_table_covers_every_category() {
        for category in Category::ALL {
            assert!(RULES.iter().any(|r| r.category == category));
        }
        assert!(!RULES.iter().any(|r| r.marker == Marker::VenvAlreadyExists));
    }

    #[test]
    fn test_created_marker() {
        let (mut c, progress, telemetry) = classifier();

        assert_eq!(
            c.process("CREATED_VENV:/home/user/project/.venv/bin/python"),
            Some(Marker::VenvCreated)
        );

        assert_eq!(
            *progress.updates.lock().unwrap(),
            vec![ProgressMessage::VenvCreated]
        );
        let events = telemetry.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, EventName::EnvironmentCreated);
        assert_eq!(events[0].reason(), Some(Reason::Created));
        assert_eq!(c.last_error(), None);
    }

    #[test]
    fn test_only_first_matching_rule_fires_per_chunk() {
        let (mut c, _, telemetry) = classifier();

        let chunk = "CREATE_VENV.UPGRADED_PIP\nCREATED_VENV:/tmp/.venv\n";
        assert_eq!(c.process(chunk), Some(Marker::VenvCreated));
        assert_eq!(telemetry.len(), 1);

        // Same chunk again: created is already reported, so the next rule gets its turn
        assert_eq!(c.process(chunk), Some(Marker::UpgradedPip));
        assert_eq!(telemetry.len(), 2);

        assert_eq!(c.process(chunk), None);
        assert_eq!(telemetry.len(), 2);
    }

    #[test]
    fn test_failure_records_last_error_without_progress() {
        let (mut c, progress, telemetry) = classifier();

        c.process("CREATE_VENV.VENV_FAILED_CREATION");

        assert!(progress.updates.lock().unwrap().is_empty());
        assert_eq!(telemetry.events()[0].reason(), Some(Reason::Other));
        assert_eq!(c.last_error(), Some(Marker::CreateVenvFailed));
    }

    #[test]
    fn test_success_does_not_clear_last_error() {
        let (mut c, _, _) = classifier();

        c.process("CREATE_VENV.UPGRADE_PIP_FAILED");
        c.process("CREATE_VENV.PIP_INSTALLED_REQUIREMENTS");

        assert_eq!(c.last_error(), Some(Marker::UpgradePipFailed));
    }

    #[test]
    fn test_fired_reports_categories_in_table_order() {
        let (mut c, _, _) = classifier();

        c.process("CREATE_VENV.PIP_INSTALLED_PYPROJECT");
        c.process("EXISTING_VENV:/tmp/.venv");
        c.process("VENV_INSTALLING_PYPROJECT:/tmp/pyproject.toml");

        let fired: Vec<_> = c.fired().collect();
        assert_eq!(
            fired,
            vec![
                Category::Created,
                Category::InstallingPackages,
                Category::InstalledPackages
            ]
        );
        assert!(!c.has_reported(Category::UpgradedPip));
    }

    #[test]
    fn test_debug_output() {
        let c = MarkerClassifier::new(crate::progress::NoOpReporter, MemorySink::new());
        let debug_str = format!("{:?}", c);
        assert!(debug_str.contains("MarkerClassifier"));
        assert!(debug_str.contains("last_error: None"));
    }
}
