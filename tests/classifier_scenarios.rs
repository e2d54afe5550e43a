//! Classifier behavior tests
//!
//! These tests drive `MarkerClassifier` the way the output pump does and check
//! the progress updates and telemetry events it produces:
//! - every rule of the table in isolation
//! - first-match-wins within a category
//! - last error bookkeeping
//! - one action per chunk

use std::sync::{Arc, Mutex};
use venvwatch::{
    EventName, InstallSource, Marker, MarkerClassifier, MemorySink, ProgressMessage,
    ProgressReporter, ProgressUpdate, Reason, TelemetryEvent,
};
use yare::parameterized;

#[derive(Default)]
struct RecordingReporter {
    updates: Mutex<Vec<ProgressMessage>>,
}

impl RecordingReporter {
    fn messages(&self) -> Vec<ProgressMessage> {
        self.updates.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.message);
    }
}

struct Harness {
    classifier: MarkerClassifier<Arc<RecordingReporter>, Arc<MemorySink>>,
    progress: Arc<RecordingReporter>,
    telemetry: Arc<MemorySink>,
}

impl Harness {
    fn new() -> Self {
        let progress = Arc::new(RecordingReporter::default());
        let telemetry = Arc::new(MemorySink::new());
        Self {
            classifier: MarkerClassifier::new(progress.clone(), telemetry.clone()),
            progress,
            telemetry,
        }
    }

    fn feed(&mut self, chunks: &[&str]) {
        for chunk in chunks {
            self.classifier.process(chunk);
        }
    }
}

fn reason(name: EventName, reason: Reason) -> TelemetryEvent {
    TelemetryEvent::venv_reason(name, reason)
}

fn using(name: EventName, using: InstallSource) -> TelemetryEvent {
    TelemetryEvent::venv_using(name, using)
}

#[parameterized(
    created = { "CREATED_VENV:/ws/.venv/bin/python", Some(ProgressMessage::VenvCreated), reason(EventName::EnvironmentCreated, Reason::Created), None },
    existing = { "EXISTING_VENV:/ws/.venv/bin/python", Some(ProgressMessage::VenvCreated), reason(EventName::EnvironmentCreated, Reason::Existing), None },
    no_venv = { "CREATE_VENV.VENV_NOT_FOUND", None, reason(EventName::EnvironmentFailed, Reason::NoVenv), Some(Marker::VenvNotInstalled) },
    no_pip = { "CREATE_VENV.PIP_NOT_FOUND", None, reason(EventName::EnvironmentFailed, Reason::NoPip), Some(Marker::PipNotInstalled) },
    upgrading_pip = { "CREATE_VENV.UPGRADING_PIP", Some(ProgressMessage::UpgradingPip), using(EventName::EnvironmentInstallingPackages, InstallSource::PipUpgrade), None },
    creation_failed = { "CREATE_VENV.VENV_FAILED_CREATION", None, reason(EventName::EnvironmentFailed, Reason::Other), Some(Marker::CreateVenvFailed) },
    installing_requirements = { "VENV_INSTALLING_REQUIREMENTS: requirements.txt", Some(ProgressMessage::InstallingPackages), using(EventName::EnvironmentInstallingPackages, InstallSource::Requirements), None },
    installing_pyproject = { "VENV_INSTALLING_PYPROJECT: pyproject.toml", Some(ProgressMessage::InstallingPackages), using(EventName::EnvironmentInstallingPackages, InstallSource::Pyproject), None },
    upgrade_pip_failed = { "CREATE_VENV.UPGRADE_PIP_FAILED", None, using(EventName::EnvironmentInstallingPackagesFailed, InstallSource::PipUpgrade), Some(Marker::UpgradePipFailed) },
    install_requirements_failed = { "CREATE_VENV.PIP_FAILED_INSTALL_REQUIREMENTS", None, using(EventName::EnvironmentInstallingPackagesFailed, InstallSource::Requirements), Some(Marker::InstallRequirementsFailed) },
    install_pyproject_failed = { "CREATE_VENV.PIP_FAILED_INSTALL_PYPROJECT", None, using(EventName::EnvironmentInstallingPackagesFailed, InstallSource::Pyproject), Some(Marker::InstallPyprojectFailed) },
    upgraded_pip = { "CREATE_VENV.UPGRADED_PIP", None, using(EventName::EnvironmentInstalledPackages, InstallSource::PipUpgrade), None },
    installed_requirements = { "CREATE_VENV.PIP_INSTALLED_REQUIREMENTS", None, using(EventName::EnvironmentInstalledPackages, InstallSource::Requirements), None },
    installed_pyproject = { "CREATE_VENV.PIP_INSTALLED_PYPROJECT", None, using(EventName::EnvironmentInstalledPackages, InstallSource::Pyproject), None },
)]
fn test_single_marker(
    chunk: &str,
    progress: Option<ProgressMessage>,
    event: TelemetryEvent,
    last_error: Option<Marker>,
) {
    let mut h = Harness::new();

    // Repeating the chunk must not repeat the action
    h.feed(&[chunk, chunk, chunk]);

    assert_eq!(h.progress.messages(), progress.into_iter().collect::<Vec<_>>());
    assert_eq!(h.telemetry.events(), vec![event]);
    assert_eq!(h.classifier.last_error(), last_error);
    assert!(event.properties.environment_type == venvwatch::telemetry::EnvironmentType::Venv);
}

#[test]
fn test_created_scenario() {
    let mut h = Harness::new();

    h.feed(&["CREATED_VENV:"]);

    assert_eq!(h.progress.messages(), vec![ProgressMessage::VenvCreated]);
    assert_eq!(
        h.telemetry.events(),
        vec![reason(EventName::EnvironmentCreated, Reason::Created)]
    );
    assert_eq!(h.classifier.last_error(), None);
}

#[test]
fn test_created_then_existing_reports_once() {
    let mut h = Harness::new();

    h.feed(&["CREATED_VENV:/ws/.venv", "EXISTING_VENV:/ws/.venv"]);

    assert_eq!(h.progress.messages(), vec![ProgressMessage::VenvCreated]);
    assert_eq!(h.telemetry.len(), 1);
    assert_eq!(h.telemetry.events()[0].reason(), Some(Reason::Created));
}

#[test]
fn test_installing_requirements_then_pyproject_reports_once() {
    let mut h = Harness::new();

    h.feed(&["VENV_INSTALLING_REQUIREMENTS:", "VENV_INSTALLING_PYPROJECT:"]);

    assert_eq!(h.progress.messages(), vec![ProgressMessage::InstallingPackages]);
    assert_eq!(
        h.telemetry.events(),
        vec![using(
            EventName::EnvironmentInstallingPackages,
            InstallSource::Requirements
        )]
    );
}

#[test]
fn test_tooling_missing_markers_share_a_flag() {
    let mut h = Harness::new();

    h.feed(&["CREATE_VENV.VENV_NOT_FOUND", "CREATE_VENV.PIP_NOT_FOUND"]);

    assert_eq!(
        h.telemetry.events(),
        vec![reason(EventName::EnvironmentFailed, Reason::NoVenv)]
    );
    assert_eq!(h.classifier.last_error(), Some(Marker::VenvNotInstalled));
}

#[test]
fn test_last_error_is_most_recent_across_categories() {
    let mut h = Harness::new();
    assert_eq!(h.classifier.last_error(), None);

    h.feed(&[
        "CREATE_VENV.VENV_NOT_FOUND",
        "CREATE_VENV.PIP_FAILED_INSTALL_REQUIREMENTS",
    ]);

    assert_eq!(h.telemetry.len(), 2);
    assert_eq!(
        h.classifier.last_error(),
        Some(Marker::InstallRequirementsFailed)
    );
}

#[test]
fn test_repeated_error_category_does_not_overwrite_last_error() {
    let mut h = Harness::new();

    h.feed(&[
        "CREATE_VENV.UPGRADE_PIP_FAILED",
        "CREATE_VENV.VENV_FAILED_CREATION",
        "CREATE_VENV.PIP_FAILED_INSTALL_PYPROJECT",
    ]);

    // Install-failed already fired for the pip upgrade; creation failure stays last
    assert_eq!(h.classifier.last_error(), Some(Marker::CreateVenvFailed));
    assert_eq!(h.telemetry.len(), 2);
}

#[test]
fn test_categories_fire_in_any_order() {
    let chunks = [
        "CREATE_VENV.PIP_INSTALLED_REQUIREMENTS",
        "CREATE_VENV.UPGRADED_PIP",
        "VENV_INSTALLING_REQUIREMENTS:",
        "CREATE_VENV.UPGRADING_PIP",
        "CREATED_VENV:",
    ];

    let mut forward = Harness::new();
    forward.feed(&chunks);

    let mut reversed = Harness::new();
    let rev: Vec<&str> = chunks.iter().rev().copied().collect();
    reversed.feed(&rev);

    assert_eq!(forward.telemetry.len(), 5);
    assert_eq!(reversed.telemetry.len(), 5);

    let mut a: Vec<_> = forward.classifier.fired().collect();
    let mut b: Vec<_> = reversed.classifier.fired().collect();
    a.sort_by_key(|c| format!("{:?}", c));
    b.sort_by_key(|c| format!("{:?}", c));
    assert_eq!(a, b);
}

#[test]
fn test_empty_and_unrelated_chunks_are_ignored() {
    let mut h = Harness::new();

    h.feed(&[
        "",
        "Collecting requests==2.31.0",
        "created_venv: lowercase does not count",
        "CREATE_VENV.VENV_ALREADY_EXISTS",
    ]);

    assert!(h.progress.messages().is_empty());
    assert!(h.telemetry.is_empty());
    assert_eq!(h.classifier.last_error(), None);
    assert_eq!(h.classifier.fired().count(), 0);
}

#[test]
fn test_one_action_per_chunk() {
    let mut h = Harness::new();
    let chunk = "CREATE_VENV.PIP_FAILED_INSTALL_REQUIREMENTS\nCREATED_VENV:/ws/.venv\n";

    assert_eq!(h.classifier.process(chunk), Some(Marker::VenvCreated));
    assert_eq!(h.telemetry.len(), 1);
    assert_eq!(h.classifier.last_error(), None);

    assert_eq!(
        h.classifier.process(chunk),
        Some(Marker::InstallRequirementsFailed)
    );
    assert_eq!(h.telemetry.len(), 2);
}

#[test]
fn test_marker_inside_longer_line() {
    let mut h = Harness::new();

    h.feed(&["[create_venv] 12:00:01 VENV_INSTALLING_PYPROJECT: /ws/pyproject.toml (extras: dev)"]);

    assert_eq!(
        h.telemetry.events()[0].using(),
        Some(InstallSource::Pyproject)
    );
}

#[test]
fn test_full_successful_run() {
    let mut h = Harness::new();

    h.feed(&[
        "Running: /usr/bin/python3 -m venv .venv",
        "CREATED_VENV:/ws/.venv/bin/python",
        "CREATE_VENV.UPGRADING_PIP",
        "Requirement already satisfied: pip",
        "CREATE_VENV.UPGRADED_PIP",
        "VENV_INSTALLING_REQUIREMENTS: /ws/requirements.txt",
        "Successfully installed requests-2.31.0",
        "CREATE_VENV.PIP_INSTALLED_REQUIREMENTS",
    ]);

    assert_eq!(
        h.progress.messages(),
        vec![
            ProgressMessage::VenvCreated,
            ProgressMessage::UpgradingPip,
            ProgressMessage::InstallingPackages,
        ]
    );
    let names: Vec<EventName> = h.telemetry.events().iter().map(|e| e.name).collect();
    assert_eq!(
        names,
        vec![
            EventName::EnvironmentCreated,
            EventName::EnvironmentInstallingPackages,
            EventName::EnvironmentInstalledPackages,
            EventName::EnvironmentInstallingPackages,
            EventName::EnvironmentInstalledPackages,
        ]
    );
    assert_eq!(h.classifier.last_error(), None);
}
