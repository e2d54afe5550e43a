//! Output formatting for run summaries and the marker table

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write as _};

use crate::pump::RunOutcome;
use crate::telemetry::{Detail, EventProperties};
use crate::venv::{Category, Rule, RULES};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct SummaryView<'a> {
    succeeded: bool,
    exit_code: Option<i32>,
    lines: usize,
    stages: &'a [Category],
    last_error: Option<&'static str>,
    error_message: Option<String>,
}

#[derive(Serialize)]
struct RuleView {
    order: usize,
    marker: &'static str,
    category: Category,
    event: &'static str,
    properties: EventProperties,
    progress: Option<&'static str>,
}

impl RuleView {
    fn new(order: usize, rule: &Rule) -> Self {
        Self {
            order,
            marker: rule.marker.as_str(),
            category: rule.category,
            event: rule.event.name.as_str(),
            properties: rule.event.properties,
            progress: rule.progress.map(|m| m.text()),
        }
    }
}

/// Output formatter for CLI results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the summary of a finished run
    pub fn format_outcome(&self, outcome: &RunOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_outcome_json(outcome),
            OutputFormat::Human => Ok(self.format_outcome_human(outcome)),
        }
    }

    /// Formats the rule table
    pub fn format_rules(&self) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rules: Vec<RuleView> = RULES
                    .iter()
                    .enumerate()
                    .map(|(i, rule)| RuleView::new(i + 1, rule))
                    .collect();
                serde_json::to_string_pretty(&rules).context("Failed to serialize rule table")
            }
            OutputFormat::Human => Ok(self.format_rules_human()),
        }
    }

    fn format_outcome_json(&self, outcome: &RunOutcome) -> Result<String> {
        let view = SummaryView {
            succeeded: outcome.succeeded(),
            exit_code: outcome.exit_code,
            lines: outcome.lines,
            stages: &outcome.fired,
            last_error: outcome.last_error.map(|m| m.as_str()),
            error_message: outcome.error_message(),
        };
        serde_json::to_string_pretty(&view).context("Failed to serialize run summary")
    }

    fn format_outcome_human(&self, outcome: &RunOutcome) -> String {
        let mut out = String::new();

        if outcome.succeeded() {
            out.push_str("Environment creation succeeded\n");
        } else {
            out.push_str("Environment creation failed\n");
        }

        let _ = writeln!(out, "  Lines processed: {}", outcome.lines);
        if let Some(code) = outcome.exit_code {
            let _ = writeln!(out, "  Exit code: {}", code);
        }

        let stages: Vec<String> = outcome
            .fired
            .iter()
            .map(|c| format!("{:?}", c))
            .collect();
        if stages.is_empty() {
            out.push_str("  Stages: none\n");
        } else {
            let _ = writeln!(out, "  Stages: {}", stages.join(", "));
        }

        if let Some(marker) = outcome.last_error {
            let _ = writeln!(out, "  Last error: {}", marker);
        }
        if let Some(message) = outcome.error_message() {
            let _ = writeln!(out, "  Error: {}", message);
        }

        out
    }

    fn format_rules_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>2}  {:<44} {:<26} {:<40} {}",
            "#", "MARKER", "CATEGORY", "EVENT", "DETAIL"
        );

        for (i, rule) in RULES.iter().enumerate() {
            let detail = match rule.event.properties.detail {
                Detail::Reason(reason) => format!("reason={:?}", reason),
                Detail::Using(using) => format!("using={:?}", using),
            };
            let _ = writeln!(
                out,
                "{:>2}  {:<44} {:<26} {:<40} {}",
                i + 1,
                rule.marker.as_str(),
                format!("{:?}", rule.category),
                rule.event.name.as_str(),
                detail
            );
        }

        out
    }
}

/// Writes rendered output to stdout
///
/// A reader that already closed the pipe is not an error.
pub fn write_stdout(text: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
