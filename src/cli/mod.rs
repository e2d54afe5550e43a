pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{ClassifyArgs, CliArgs, Commands, MarkersArgs, RunArgs, WatchArgs};
pub use output::{OutputFormat, OutputFormatter};
