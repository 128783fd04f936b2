//! Logging and observability infrastructure for handoffcheck
//!
//! Structured logging through `tracing`. Every handoff carries `trace_id` and
//! `handoff_type` fields so a payload can be followed across validation,
//! correction attempts and monitor updates.

use std::io::IsTerminal;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `handoffcheck=info`, or
/// `handoffcheck=debug` when `verbose` is true. Logs go to stderr so that
/// `--json` output on stdout stays machine-readable.
pub fn init_tracing(verbose: bool, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("handoffcheck=debug,warn")
            } else {
                EnvFilter::try_new("handoffcheck=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(false),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            let span_events = if verbose {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(use_color())
                        .with_target(verbose)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .with_span_events(span_events)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Create a span covering one handoff validation
pub fn handoff_span(trace_id: &str, handoff_type: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "handoff_validation",
        trace_id = %trace_id,
        handoff_type = %handoff_type,
    )
}

pub fn log_validation_start(trace_id: &str, handoff_type: &str, allow_correction: bool) {
    info!(
        trace_id = %trace_id,
        handoff_type = %handoff_type,
        allow_correction,
        "Starting handoff validation"
    );
}

/// Log the terminal state of a handoff validation
pub fn log_validation_complete(trace_id: &str, state: &str, duration_ms: u128, is_valid: bool) {
    if is_valid {
        info!(
            trace_id = %trace_id,
            state = %state,
            duration_ms = %duration_ms,
            "Handoff validation completed"
        );
    } else {
        warn!(
            trace_id = %trace_id,
            state = %state,
            duration_ms = %duration_ms,
            "Handoff rejected"
        );
    }
}

pub fn log_correction_attempt(trace_id: &str, attempt: u32, max_attempts: u32) {
    info!(
        trace_id = %trace_id,
        attempt,
        max_attempts,
        "Requesting AI correction"
    );
}
