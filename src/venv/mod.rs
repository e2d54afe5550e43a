//! venv creation output classification
//!
//! - `markers`: the sentinel vocabulary printed by the creation script
//! - `classifier`: ordered rule table turning markers into progress and telemetry

pub mod classifier;
pub mod markers;

pub use classifier::{Category, MarkerClassifier, Rule, RULES};
pub use markers::{ErrorKind, Marker};
