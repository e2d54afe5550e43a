//! Telemetry sink trait and implementations

use super::event::TelemetryEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Trait for receiving telemetry events
pub trait TelemetrySink: Send + Sync {
    /// Called once per reported event
    fn emit(&self, event: &TelemetryEvent);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Arc<T> {
    fn emit(&self, event: &TelemetryEvent) {
        (**self).emit(event)
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn emit(&self, event: &TelemetryEvent) {
        (**self).emit(event)
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &T {
    fn emit(&self, event: &TelemetryEvent) {
        (**self).emit(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl TelemetrySink for NoOpSink {
    fn emit(&self, _event: &TelemetryEvent) {}
}

/// Sink that logs events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl TelemetrySink for LoggingSink {
    fn emit(&self, event: &TelemetryEvent) {
        let properties = serde_json::to_string(&event.properties).unwrap_or_default();
        info!(event = %event.name, properties = %properties, "Telemetry event");
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events received so far, in emission order
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, event: &TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(*event);
        }
    }
}

#[derive(Serialize)]
struct TimestampedEvent<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a TelemetryEvent,
}

/// Sink that writes one JSON object per event to a writer
///
/// Write failures are logged and otherwise ignored so a broken telemetry file
/// never interrupts environment creation.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
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

    fn write_event(&self, event: &TelemetryEvent) -> std::io::Result<()> {
        let record = TimestampedEvent {
            timestamp: Utc::now(),
            event,
        };
        let line = serde_json::to_string(&record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::Other, "telemetry writer lock poisoned")
            })?;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

impl<W: Write + Send> TelemetrySink for JsonLinesSink<W> {
    fn emit(&self, event: &TelemetryEvent) {
        if let Err(e) = self.write_event(event) {
            warn!(event = %event.name, error = %e, "Failed to write telemetry event");
        }
    }
}

/// Forwards every event to each inner sink in order
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for MultiSink {
    fn emit(&self, event: &TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
