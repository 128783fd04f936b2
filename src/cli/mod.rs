//! Command-line interface for handoffcheck
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and output rendering
//! - `tests`: Test module (cfg(test) only)

pub mod args;
mod commands;
mod run;


pub use args::{Cli, Commands, LogFormatArg, build_cli};
pub use commands::{config_json, read_json_input, render_config, render_report, resolve_handoff_type};
pub use run::{cli_args_from, run, run_with};
