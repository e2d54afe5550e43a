use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Progress and telemetry classifier for venv creation output
#[derive(Parser, Debug)]
#[command(
    name = "venvwatch",
    about = "Progress and telemetry classifier for venv creation output",
    version,
    author,
    long_about = "venvwatch follows the output of a Python virtual environment creation \
                  script, reports each lifecycle stage once (created, upgrading pip, \
                  installing packages) and emits a telemetry event per stage. The last \
                  failure marker decides the exit code."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress progress output"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// Log level chosen on the command line, if any
    ///
    /// `--log-level` wins over `-v` (debug) and `-q` (error).
    pub fn log_level_override(&self) -> Option<&str> {
        if let Some(level) = self.log_level.as_deref() {
            Some(level)
        } else if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Classify saved creation output",
        long_about = "Reads creation output from a file (or stdin) and classifies it line \
                      by line.\n\n\
                      Examples:\n  \
                      venvwatch watch create.log\n  \
                      python create_venv.py 2>&1 | venvwatch watch"
    )]
    Watch(WatchArgs),

    #[command(
        about = "Run a creation command and classify its output live",
        long_about = "Spawns the given command, classifies its stdout and stderr as they \
                      arrive and exits non-zero if a failure marker was seen or the command \
                      failed.\n\n\
                      Examples:\n  \
                      venvwatch run -- python create_venv.py --git-ignore\n  \
                      venvwatch run --telemetry events.jsonl -- python3 create_venv.py"
    )]
    Run(RunArgs),

    #[command(about = "List the recognized markers and the rule order")]
    Markers(MarkersArgs),
}

/// Options shared by the classifying subcommands
#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Summary format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        value_name = "FILE",
        help = "Append telemetry events as JSON lines to FILE"
    )]
    pub telemetry: Option<PathBuf>,

    #[arg(long, conflicts_with = "telemetry", help = "Disable telemetry events")]
    pub no_telemetry: bool,

    #[arg(
        long,
        help = "Echo classified output (stderr lines stay on stderr)"
    )]
    pub echo: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    #[arg(value_name = "FILE", help = "Output to classify (defaults to stdin)")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub classify: ClassifyArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub classify: ClassifyArgs,

    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Creation command and its arguments"
    )]
    pub command: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MarkersArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
