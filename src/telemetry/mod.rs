//! Telemetry events emitted during environment creation

mod event;
mod sink;

pub use event::{
    Detail, EnvironmentType, EventName, EventProperties, InstallSource, Reason, TelemetryEvent,
};
pub use sink::{JsonLinesSink, LoggingSink, MemorySink, MultiSink, NoOpSink, TelemetrySink};
