//! Subcommand handlers
//!
//! Each handler returns the process exit code: 0 on success, 1 when the
//! environment creation failed, 2 when venvwatch itself could not do its job.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing::{error, info};

use super::commands::{ClassifyArgs, MarkersArgs, RunArgs, WatchArgs};
use super::output::{write_stdout, OutputFormatter};
use crate::config::WatchConfig;
use crate::progress::{ConsoleReporter, NoOpReporter, ProgressReporter};
use crate::pump::{self, RunOutcome};
use crate::telemetry::{JsonLinesSink, LoggingSink, MultiSink};
use crate::venv::MarkerClassifier;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CREATION_FAILED: i32 = 1;
pub const EXIT_USAGE_ERROR: i32 = 2;

type CliClassifier = MarkerClassifier<Box<dyn ProgressReporter>, MultiSink>;

fn open_telemetry_file(path: &Path) -> Result<JsonLinesSink<BufWriter<File>>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open telemetry file {}", path.display()))?;
    Ok(JsonLinesSink::new(BufWriter::new(file)))
}

fn build_telemetry(config: &WatchConfig, args: &ClassifyArgs) -> Result<MultiSink> {
    let mut sink = MultiSink::new();
    if args.no_telemetry || !config.telemetry_enabled {
        return Ok(sink);
    }

    sink.push(Box::new(LoggingSink));
    if let Some(path) = args.telemetry.as_ref().or(config.telemetry_file.as_ref()) {
        sink.push(Box::new(open_telemetry_file(path)?));
    }
    Ok(sink)
}

fn build_classifier(
    config: &WatchConfig,
    args: &ClassifyArgs,
    quiet: bool,
) -> Result<CliClassifier> {
    let progress: Box<dyn ProgressReporter> = if quiet {
        Box::new(NoOpReporter)
    } else {
        Box::new(ConsoleReporter::stderr())
    };
    Ok(MarkerClassifier::new(progress, build_telemetry(config, args)?))
}

fn finish(outcome: &RunOutcome, args: &ClassifyArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());
    let summary = match formatter.format_outcome(outcome) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_USAGE_ERROR;
        }
    };
    if let Err(e) = write_stdout(&summary) {
        error!(error = %e, "Failed to write summary");
        return EXIT_USAGE_ERROR;
    }

    if outcome.succeeded() {
        EXIT_SUCCESS
    } else {
        EXIT_CREATION_FAILED
    }
}

fn watch(args: &WatchArgs, config: &WatchConfig, quiet: bool) -> Result<RunOutcome> {
    let mut classifier = build_classifier(config, &args.classify, quiet)?;
    let options = config.pump_options(args.classify.echo);

    let outcome = match &args.input {
        Some(path) => {
            info!(input = %path.display(), "Classifying saved output");
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            pump::feed_reader(BufReader::new(file), &mut classifier, options)?
        }
        None => {
            info!("Classifying output from stdin");
            pump::feed_reader(io::stdin().lock(), &mut classifier, options)?
        }
    };
    Ok(outcome)
}

pub fn handle_watch(args: &WatchArgs, config: &WatchConfig, quiet: bool) -> i32 {
    match watch(args, config, quiet) {
        Ok(outcome) => finish(&outcome, &args.classify),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_USAGE_ERROR
        }
    }
}

async fn run(args: &RunArgs, config: &WatchConfig, quiet: bool) -> Result<RunOutcome> {
    let mut classifier = build_classifier(config, &args.classify, quiet)?;
    let options = config.pump_options(args.classify.echo);

    let (program, rest) = args
        .command
        .split_first()
        .context("No command given to run")?;

    let outcome = pump::run_command(program, rest, &mut classifier, options).await?;
    Ok(outcome)
}

pub async fn handle_run(args: &RunArgs, config: &WatchConfig, quiet: bool) -> i32 {
    match run(args, config, quiet).await {
        Ok(outcome) => finish(&outcome, &args.classify),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_USAGE_ERROR
        }
    }
}

pub fn handle_markers(args: &MarkersArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_rules() {
        Ok(table) => match write_stdout(&table) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_USAGE_ERROR
            }
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_USAGE_ERROR
        }
    }
}
