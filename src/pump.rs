//! Output pump feeding subprocess output into a [`MarkerClassifier`]
//!
//! The classifier expects serial calls, so the async pump reads stdout and
//! stderr on separate tasks and funnels every line through one bounded channel
//! drained by a single consumer.

use crate::progress::ProgressReporter;
use crate::telemetry::TelemetrySink;
use crate::venv::{Category, Marker, MarkerClassifier};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Errors raised while driving the subprocess
#[derive(Debug, Error)]
pub enum PumpError {
    /// The program could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// stdout or stderr was not captured
    #[error("Subprocess {0} was not captured")]
    MissingPipe(&'static str),

    /// Reading output or waiting for the process failed
    #[error("I/O error while reading subprocess output: {0}")]
    Io(#[from] io::Error),
}

/// Tuning for how output is pumped
#[derive(Debug, Clone, Copy)]
pub struct PumpOptions {
    /// Bound of the line channel between reader tasks and the classifier
    pub channel_capacity: usize,

    /// Copy each line back to the stream it came from after classifying it
    pub echo: bool,
}

impl Default for PumpOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            echo: false,
        }
    }
}

/// Pipe a line of subprocess output arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Passes classified lines through to our own stdout/stderr
///
/// The first failed write turns echoing off; a reader that closed the pipe
/// (`venvwatch watch --echo log | head`) is expected and only logged at debug.
struct Echo<O, E> {
    stdout: O,
    stderr: E,
    enabled: bool,
}

impl Echo<io::Stdout, io::Stderr> {
    fn std(enabled: bool) -> Self {
        Self {
            stdout: io::stdout(),
            stderr: io::stderr(),
            enabled,
        }
    }
}

impl<O: Write, E: Write> Echo<O, E> {
    fn line(&mut self, stream: Stream, line: &str) {
        if !self.enabled {
            return;
        }

        let out: &mut dyn Write = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        let result = out.write_all(line.as_bytes()).and_then(|()| out.flush());

        if let Err(e) = result {
            if e.kind() == io::ErrorKind::BrokenPipe {
                debug!(?stream, "Echo target closed, no longer echoing");
            } else {
                warn!(?stream, error = %e, "Failed to echo output, no longer echoing");
            }
            self.enabled = false;
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Exit code of the subprocess; `None` when classifying a saved log or
    /// when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub lines: usize,
    pub fired: Vec<Category>,
    pub last_error: Option<Marker>,
}

impl RunOutcome {
    fn from_classifier<P: ProgressReporter, T: TelemetrySink>(
        classifier: &MarkerClassifier<P, T>,
        lines: usize,
        exit_code: Option<i32>,
    ) -> Self {
        Self {
            exit_code,
            lines,
            fired: classifier.fired().collect(),
            last_error: classifier.last_error(),
        }
    }

    /// True when no error marker was seen and the process (if any) exited cleanly
    pub fn succeeded(&self) -> bool {
        self.last_error.is_none() && self.exit_code.map_or(true, |code| code == 0)
    }

    /// User-facing description of the failure, if the run failed
    pub fn error_message(&self) -> Option<String> {
        if let Some(marker) = self.last_error {
            return marker.error_description().map(str::to_string);
        }
        match self.exit_code {
            Some(0) | None => None,
            Some(code) => Some(format!(
                "Environment creation exited with code {} without reporting a cause",
                code
            )),
        }
    }
}

/// Feeds a synchronous reader into the classifier line by line
///
/// Invalid UTF-8 is replaced rather than rejected. Returns the outcome with
/// `exit_code` left unset.
pub fn feed_reader<R, P, T>(
    mut reader: R,
    classifier: &mut MarkerClassifier<P, T>,
    options: PumpOptions,
) -> Result<RunOutcome, PumpError>
where
    R: BufRead,
    P: ProgressReporter,
    T: TelemetrySink,
{
    let mut echo = Echo::std(options.echo);
    let mut buf = Vec::new();
    let mut lines = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        lines += 1;
        classifier.process(&line);
        echo.line(Stream::Stdout, &line);
    }

    debug!(lines, "Finished reading output");
    Ok(RunOutcome::from_classifier(classifier, lines, None))
}

/// Spawns `program` and classifies its stdout and stderr until it exits
pub async fn run_command<P, T>(
    program: &str,
    args: &[String],
    classifier: &mut MarkerClassifier<P, T>,
    options: PumpOptions,
) -> Result<RunOutcome, PumpError>
where
    P: ProgressReporter,
    T: TelemetrySink,
{
    info!(program, ?args, "Starting environment creation");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PumpError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or(PumpError::MissingPipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(PumpError::MissingPipe("stderr"))?;

    let (tx, mut rx) = mpsc::channel::<(Stream, String)>(options.channel_capacity.max(1));
    let readers = [
        tokio::spawn(forward_lines(stdout, tx.clone(), Stream::Stdout)),
        tokio::spawn(forward_lines(stderr, tx, Stream::Stderr)),
    ];

    let mut echo = Echo::std(options.echo);
    let mut lines = 0;
    while let Some((stream, line)) = rx.recv().await {
        lines += 1;
        classifier.process(&line);
        echo.line(stream, &line);
    }

    for reader in readers {
        match reader.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "Output reader task failed"),
        }
    }

    let status = child.wait().await?;
    debug!(lines, status = %status, "Environment creation finished");

    Ok(RunOutcome::from_classifier(classifier, lines, status.code()))
}

async fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<(Stream, String)>,
    stream: Stream,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        trace!(?stream, line = %line.trim_end(), "Subprocess output");
        if tx.send((stream, line)).await.is_err() {
            // Consumer went away; nothing left to classify
            break;
        }
    }

    Ok(())
}
