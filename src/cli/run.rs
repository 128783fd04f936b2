//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, initializes tracing, discovers configuration,
//! creates the tokio runtime, dispatches to a command handler and prints any
//! error. main.rs only maps the returned code to the process exit status.

use clap::Parser;
use tracing::debug;

use super::args::{Cli, Commands};
use super::commands;

use crate::error::ConfigError;
use crate::logging::init_tracing;
use crate::{CliArgs, Config, ExitCode, HandoffCheckError};

/// Main CLI execution function.
///
/// Returns `Ok(())` when the handoff was accepted (or the command succeeded)
/// and `Err(ExitCode)` otherwise. All output, including errors, is printed
/// here.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    run_with(cli)
}

/// Run an already parsed command line
pub fn run_with(cli: Cli) -> Result<(), ExitCode> {
    // A second init (tests, embedding) is harmless
    let _ = init_tracing(cli.verbose, cli.log_format.into());

    let cli_args = cli_args_from(&cli);
    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let code = match err.downcast::<ConfigError>() {
                Ok(config_err) => {
                    let err = HandoffCheckError::from(config_err);
                    eprintln!("{}", err.display_for_user());
                    err.to_exit_code()
                }
                Err(err) => report_error(&err, "config"),
            };
            return Err(code);
        }
    };
    debug!(provider = config.provider(), "Configuration loaded");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.name();
    let result = rt.block_on(async {
        match &cli.command {
            Commands::Validate {
                file,
                handoff_type,
                json,
                ..
            } => {
                commands::execute_validate_command(file, handoff_type.as_deref(), *json, &config)
                    .await
            }
            Commands::Package { file, json } => {
                commands::execute_package_command(file, *json, &config)
            }
            Commands::Contract { contract } => commands::execute_contract_command(contract),
            Commands::Config { json } => commands::execute_config_command(*json, &config),
        }
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => Err(report_error(&error, operation)),
    }
}

/// Map parsed flags onto configuration overrides
#[must_use]
pub fn cli_args_from(cli: &Cli) -> CliArgs {
    let (allow_correction, agent_id) = match &cli.command {
        Commands::Validate {
            correct, agent_id, ..
        } => (correct.then_some(true), agent_id.clone()),
        _ => (None, None),
    };
    CliArgs {
        config_path: cli.config.clone(),
        max_validation_time_ms: cli.max_validation_time_ms,
        llm_provider: cli.llm_provider.clone(),
        model: cli.model.clone(),
        agent_id,
        allow_correction,
    }
}

/// Print an error with context and return its exit code
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(err) = error.downcast_ref::<HandoffCheckError>() {
        eprintln!("{}", err.display_for_user());
        print_chain(error);
        return err.to_exit_code();
    }
    eprintln!("✗ {operation} failed: {error:#}");
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}

fn print_chain(error: &anyhow::Error) {
    let mut chain = error.chain().skip(1).peekable();
    if chain.peek().is_none() {
        return;
    }
    // anyhow keeps the outermost context first
    eprintln!("\n  While: {error}");
    for cause in chain {
        eprintln!("    caused by: {cause}");
    }
}
