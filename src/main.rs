use venvwatch::cli::commands::{CliArgs, Commands};
use venvwatch::cli::handlers::{handle_markers, handle_run, handle_watch, EXIT_USAGE_ERROR};
use venvwatch::util::{init_logging, LoggingConfig};
use venvwatch::{WatchConfig, VERSION};

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match WatchConfig::load(args.log_level_override()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Invalid venvwatch configuration: {}", e);
            std::process::exit(EXIT_USAGE_ERROR);
        }
    };
    init_logging(LoggingConfig::from_config(&config));

    debug!("venvwatch v{} starting", VERSION);
    debug!("Arguments: {:?}", args);
    debug!(?config, "Loaded configuration");

    let exit_code = match &args.command {
        Commands::Watch(watch_args) => handle_watch(watch_args, &config, args.quiet),
        Commands::Run(run_args) => handle_run(run_args, &config, args.quiet).await,
        Commands::Markers(markers_args) => handle_markers(markers_args),
    };

    std::process::exit(exit_code);
}
