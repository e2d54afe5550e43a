//! Telemetry event vocabulary

use serde::{Serialize, Serializer};
use std::fmt;

/// Name of a telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    EnvironmentCreated,
    EnvironmentFailed,
    EnvironmentInstallingPackages,
    EnvironmentInstallingPackagesFailed,
    EnvironmentInstalledPackages,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::EnvironmentCreated => "environment-created",
            EventName::EnvironmentFailed => "environment-failed",
            EventName::EnvironmentInstallingPackages => "environment-installing-packages",
            EventName::EnvironmentInstallingPackagesFailed => {
                "environment-installing-packages-failed"
            }
            EventName::EnvironmentInstalledPackages => "environment-installed-packages",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kind of environment the event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Venv,
}

/// Why an environment was created or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reason {
    Created,
    Existing,
    NoVenv,
    NoPip,
    Other,
}

/// Where installed packages came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstallSource {
    #[serde(rename = "requirements.txt")]
    Requirements,
    #[serde(rename = "pyproject.toml")]
    Pyproject,
    #[serde(rename = "pipUpgrade")]
    PipUpgrade,
}

/// Discriminator carried alongside the environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Detail {
    Reason(Reason),
    Using(InstallSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProperties {
    pub environment_type: EnvironmentType,
    #[serde(flatten)]
    pub detail: Detail,
}

/// A structured (name, properties) record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    pub name: EventName,
    pub properties: EventProperties,
}

impl TelemetryEvent {
    pub const fn venv_reason(name: EventName, reason: Reason) -> Self {
        Self {
            name,
            properties: EventProperties {
                environment_type: EnvironmentType::Venv,
                detail: Detail::Reason(reason),
            },
        }
    }

    pub const fn venv_using(name: EventName, using: InstallSource) -> Self {
        Self {
            name,
            properties: EventProperties {
                environment_type: EnvironmentType::Venv,
                detail: Detail::Using(using),
            },
        }
    }

    pub fn reason(&self) -> Option<Reason> {
        match self.properties.detail {
            Detail::Reason(reason) => Some(reason),
            Detail::Using(_) => None,
        }
    }

    pub fn using(&self) -> Option<InstallSource> {
        match self.properties.detail {
            Detail::Using(using) => Some(using),
            Detail::Reason(_) => None,
        }
    }
}
