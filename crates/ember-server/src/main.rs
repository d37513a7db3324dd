//! Binary entry point for the extension server.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use ember_server::cli::Cli;
use ember_server::telemetry;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(telemetry_error) = telemetry::initialise(&cli.log_filter, cli.log_format) {
        // No subscriber is installed; stderr is all we have.
        eprintln!("ember-server: {telemetry_error}");
        return ExitCode::FAILURE;
    }

    match ember_server::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!(error = %run_error, "server terminated");
            ExitCode::FAILURE
        }
    }
}
