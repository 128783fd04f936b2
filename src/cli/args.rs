//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use handoffcheck_utils::logging::LogFormat;

/// handoffcheck - contract validation and AI correction for pipeline handoffs
#[derive(Parser, Debug)]
#[command(name = "handoffcheck")]
#[command(about = "Validate pipeline handoff payloads against their contracts and repair them with an LLM")]
#[command(long_about = r#"
handoffcheck validates the JSON payloads that stages of a content pipeline hand
to each other (content → design → quality → delivery). Rejected payloads can be
repaired by a generative backend in at most three correction attempts.

EXAMPLES:
  # Validate a content handoff
  handoffcheck validate content.json --type content-to-design

  # Let the configured LLM repair a rejected payload, JSON output
  handoffcheck validate content.json --correct --json

  # Read the payload from stdin
  cat design.json | handoffcheck validate - --type design-to-quality

  # Validate a delivery package
  handoffcheck package delivery.json

  # Show a contract or the effective configuration
  handoffcheck contract quality-to-delivery
  handoffcheck config --json

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .handoffcheck/config.toml
  HANDOFFCHECK_HOME or --config select an explicit location

EXIT CODES:
  0 accepted, 1 internal error, 2 CLI/config error, 3 rejected,
  4 correction failed, 10 timeout, 70 LLM backend failure
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Deadline for one validation including corrections, in milliseconds
    #[arg(long, global = true)]
    pub max_validation_time_ms: Option<u64>,

    /// LLM provider used for correction (openrouter, anthropic)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// Model to use for correction calls
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a stage handoff payload
    ///
    /// EXAMPLES:
    ///   handoffcheck validate content.json --type content-to-design
    ///   handoffcheck validate quality.json --correct --json
    Validate {
        /// Payload file, or '-' for stdin
        file: PathBuf,

        /// Handoff type; detected from the payload's `handoff_type` field when omitted
        #[arg(long = "type", value_name = "HANDOFF_TYPE")]
        handoff_type: Option<String>,

        /// Attempt AI correction of a rejected payload
        #[arg(long)]
        correct: bool,

        /// Output the handoff report as JSON
        #[arg(long)]
        json: bool,

        /// Agent id reported to the validation monitor
        #[arg(long)]
        agent_id: Option<String>,
    },

    /// Validate a delivery package
    Package {
        /// Package file, or '-' for stdin
        file: PathBuf,

        /// Output the validation result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the contract for a handoff type or the delivery package
    Contract {
        /// content-to-design, design-to-quality, quality-to-delivery or delivery-package
        contract: String,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validate { .. } => "validate",
            Self::Package { .. } => "package",
            Self::Contract { .. } => "contract",
            Self::Config { .. } => "config",
        }
    }
}

/// Build the clap command for inspection in tests and shell completion
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
