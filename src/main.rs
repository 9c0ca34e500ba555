//! reachwatch: reachability monitor with debounced alerting
//!
//! Entry point for the reachwatch application.

use reachwatch::config::{Cli, Command, ValidatedConfig, write_default_config};
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match &cli.command {
        Some(Command::Init { output }) => return handle_init(output),
        Some(Command::Reset { group }) => return handle_reset(&cli, group),
        None => {}
    }

    // Load and validate configuration
    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Setup logging and run
    if let Err(e) = setup_tracing(config.verbose, config.log_file.as_deref()) {
        eprintln!("Failed to open log file: {e}");
        return exit_code::CONFIG_ERROR;
    }
    tracing::info!("{config}");

    run_application(config)
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `reset` subcommand.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn handle_reset(cli: &Cli, group: &str) -> ExitCode {
    let reset = match ValidatedConfig::load_reset(cli, group) {
        Ok(reset) => reset,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    if let Err(e) = setup_tracing(cli.verbose, reset.log_file.as_deref()) {
        eprintln!("Failed to open log file: {e}");
        return exit_code::CONFIG_ERROR;
    }

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    match runtime.block_on(run::reset(reset.state_file.as_deref(), group)) {
        Ok(cleared) => {
            println!("Cleared {cleared} stored status(es) of group {group}");
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::runtime_error()
        }
    }
}

/// Runs the main application with the given configuration.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_application(config: ValidatedConfig) -> ExitCode {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    match runtime.block_on(run::execute(config)) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Application error: {e}");
            exit_code::runtime_error()
        }
    }
}
