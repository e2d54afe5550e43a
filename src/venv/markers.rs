//! Sentinel markers printed by the venv creation script
//!
//! The script writes these tokens into its stdout/stderr so the caller can
//! follow the creation lifecycle without parsing pip or venv output. They are
//! matched byte-for-byte (case-sensitive substring containment).

use serde::Serialize;
use std::fmt;

pub const VENV_CREATED_MARKER: &str = "CREATED_VENV:";
pub const VENV_EXISTING_MARKER: &str = "EXISTING_VENV:";
pub const INSTALLING_REQUIREMENTS: &str = "VENV_INSTALLING_REQUIREMENTS:";
pub const INSTALLING_PYPROJECT: &str = "VENV_INSTALLING_PYPROJECT:";
pub const PIP_NOT_INSTALLED_MARKER: &str = "CREATE_VENV.PIP_NOT_FOUND";
pub const VENV_NOT_INSTALLED_MARKER: &str = "CREATE_VENV.VENV_NOT_FOUND";
pub const INSTALL_REQUIREMENTS_FAILED_MARKER: &str = "CREATE_VENV.PIP_FAILED_INSTALL_REQUIREMENTS";
pub const INSTALL_PYPROJECT_FAILED_MARKER: &str = "CREATE_VENV.PIP_FAILED_INSTALL_PYPROJECT";
pub const CREATE_VENV_FAILED_MARKER: &str = "CREATE_VENV.VENV_FAILED_CREATION";
pub const VENV_ALREADY_EXISTS_MARKER: &str = "CREATE_VENV.VENV_ALREADY_EXISTS";
pub const INSTALLED_REQUIREMENTS_MARKER: &str = "CREATE_VENV.PIP_INSTALLED_REQUIREMENTS";
pub const INSTALLED_PYPROJECT_MARKER: &str = "CREATE_VENV.PIP_INSTALLED_PYPROJECT";
pub const UPGRADE_PIP_FAILED_MARKER: &str = "CREATE_VENV.UPGRADE_PIP_FAILED";
pub const UPGRADING_PIP_MARKER: &str = "CREATE_VENV.UPGRADING_PIP";
pub const UPGRADED_PIP_MARKER: &str = "CREATE_VENV.UPGRADED_PIP";

/// A lifecycle marker emitted by the venv creation script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    VenvCreated,
    VenvExisting,
    VenvNotInstalled,
    PipNotInstalled,
    UpgradingPip,
    CreateVenvFailed,
    InstallingRequirements,
    InstallingPyproject,
    UpgradePipFailed,
    InstallRequirementsFailed,
    InstallPyprojectFailed,
    UpgradedPip,
    InstalledRequirements,
    InstalledPyproject,
    /// Printed by the script but not tracked by any rule
    VenvAlreadyExists,
}

/// Broad classification of the failure markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// `venv` module or `pip` missing from the selected interpreter
    ToolingMissing,
    /// `python -m venv` itself failed
    CreationFailed,
    /// Upgrading pip or installing dependencies failed
    InstallFailed,
}

impl Marker {
    /// Every marker in the vocabulary, in rule order followed by untracked markers
    pub const ALL: [Marker; 15] = [
        Marker::VenvCreated,
        Marker::VenvExisting,
        Marker::VenvNotInstalled,
        Marker::PipNotInstalled,
        Marker::UpgradingPip,
        Marker::CreateVenvFailed,
        Marker::InstallingRequirements,
        Marker::InstallingPyproject,
        Marker::UpgradePipFailed,
        Marker::InstallRequirementsFailed,
        Marker::InstallPyprojectFailed,
        Marker::UpgradedPip,
        Marker::InstalledRequirements,
        Marker::InstalledPyproject,
        Marker::VenvAlreadyExists,
    ];

    /// The literal token the script prints
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::VenvCreated => VENV_CREATED_MARKER,
            Marker::VenvExisting => VENV_EXISTING_MARKER,
            Marker::VenvNotInstalled => VENV_NOT_INSTALLED_MARKER,
            Marker::PipNotInstalled => PIP_NOT_INSTALLED_MARKER,
            Marker::UpgradingPip => UPGRADING_PIP_MARKER,
            Marker::CreateVenvFailed => CREATE_VENV_FAILED_MARKER,
            Marker::InstallingRequirements => INSTALLING_REQUIREMENTS,
            Marker::InstallingPyproject => INSTALLING_PYPROJECT,
            Marker::UpgradePipFailed => UPGRADE_PIP_FAILED_MARKER,
            Marker::InstallRequirementsFailed => INSTALL_REQUIREMENTS_FAILED_MARKER,
            Marker::InstallPyprojectFailed => INSTALL_PYPROJECT_FAILED_MARKER,
            Marker::UpgradedPip => UPGRADED_PIP_MARKER,
            Marker::InstalledRequirements => INSTALLED_REQUIREMENTS_MARKER,
            Marker::InstalledPyproject => INSTALLED_PYPROJECT_MARKER,
            Marker::VenvAlreadyExists => VENV_ALREADY_EXISTS_MARKER,
        }
    }

    /// True if `chunk` contains this marker anywhere
    pub fn found_in(self, chunk: &str) -> bool {
        chunk.contains(self.as_str())
    }

    pub fn error_kind(self) -> Option<ErrorKind> {
        match self {
            Marker::VenvNotInstalled | Marker::PipNotInstalled => Some(ErrorKind::ToolingMissing),
            Marker::CreateVenvFailed => Some(ErrorKind::CreationFailed),
            Marker::UpgradePipFailed
            | Marker::InstallRequirementsFailed
            | Marker::InstallPyprojectFailed => Some(ErrorKind::InstallFailed),
            _ => None,
        }
    }

    pub fn is_error(self) -> bool {
        self.error_kind().is_some()
    }

    /// User-facing explanation for a failure marker
    pub fn error_description(self) -> Option<&'static str> {
        let text = match self {
            Marker::VenvNotInstalled => {
                "The selected Python interpreter does not provide the 'venv' module"
            }
            Marker::PipNotInstalled => "The selected Python interpreter does not provide 'pip'",
            Marker::CreateVenvFailed => "Failed to create the virtual environment",
            Marker::UpgradePipFailed => "Failed to upgrade pip in the virtual environment",
            Marker::InstallRequirementsFailed => {
                "Failed to install packages from the requirements file"
            }
            Marker::InstallPyprojectFailed => "Failed to install packages from pyproject.toml",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
