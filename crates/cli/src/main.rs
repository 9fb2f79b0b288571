//! Pathoscope - Main Entry Point

use clap::Parser;
use pathoscope_cli::{exit_status, init_logging, run, Cli, Settings, EXIT_CONFIG};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if let Err(e) = init_logging(&settings) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    info!("=== Pathoscope v{} ===", env!("CARGO_PKG_VERSION"));

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}
