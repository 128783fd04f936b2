//! handoffcheck - contract validation and AI correction for pipeline handoffs
//!
//! A staged content pipeline (content → design → quality → delivery) hands
//! JSON payloads between stages. handoffcheck checks each payload against the
//! contract of the boundary it is crossing, optionally repairs rejected
//! payloads through a generative backend, and tracks validation health.
//!
//! handoffcheck can be used in two ways:
//! - **CLI**: `handoffcheck validate payload.json --type content-to-design --correct`
//! - **Library**: build a [`HandoffValidator`] and call it from your pipeline
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Validate without correction (exit code 3 when rejected)
//! handoffcheck validate content.json --type content-to-design
//!
//! # Validate and let the configured LLM repair the payload
//! handoffcheck validate content.json --correct --json
//!
//! # Validate a delivery package
//! handoffcheck package delivery.json
//!
//! # Print a contract and the effective configuration
//! handoffcheck contract quality-to-delivery
//! handoffcheck config
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use handoffcheck::{Config, HandoffType, build_validator};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), handoffcheck::HandoffCheckError> {
//! let config = Config::builder().allow_correction(true).build()?;
//! let validator = build_validator(&config)?;
//!
//! let payload = json!({"trace_id": "content-1700000000000-abcd"});
//! let result = validator
//!     .validate(&payload, HandoffType::ContentToDesign, true)
//!     .await;
//! if !result.is_valid {
//!     for error in result.critical_errors() {
//!         eprintln!("{error}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Exit Codes
//!
//! See [`ExitCode`]: 0 accepted, 1 internal, 2 CLI/config, 3 rejected,
//! 4 correction failed, 10 timeout, 70 LLM backend failure.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

// ============================================================================
// Stable Public API
// ============================================================================

pub use handoffcheck_config::{CliArgs, Config, ConfigBuilder, ConfigSource};
pub use handoffcheck_contracts::{
    ContractKind, CorrectionSuggestion, DeliveryPackage, ErrorType, HandoffPayload, HandoffType,
    Priority, Severity, ValidationError, ValidationResult,
};
pub use handoffcheck_corrector::{AiCorrector, CorrectionFailure, CorrectionStats, CorrectorSettings};
pub use handoffcheck_llm::{LlmBackend, LlmInvocation, LlmResult};
pub use handoffcheck_monitor::{
    HealthCheckReceiver, HealthReport, HealthStatus, MonitorSettings, MonitoringConfig,
    ValidationMonitor,
};
pub use handoffcheck_orchestrator::{
    FailureReason, HandoffReport, HandoffSettings, HandoffState, HandoffValidator,
};
pub use handoffcheck_utils::error::{ErrorCategory, HandoffCheckError, UserFriendlyError};
pub use handoffcheck_utils::exit_codes::ExitCode;

use handoffcheck_llm::LlmError;

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use handoffcheck_config as config;
#[doc(hidden)]
pub use handoffcheck_contracts as contracts;
#[doc(hidden)]
pub use handoffcheck_corrector as corrector;
#[doc(hidden)]
pub use handoffcheck_llm as llm;
#[doc(hidden)]
pub use handoffcheck_monitor as monitor;
#[doc(hidden)]
pub use handoffcheck_orchestrator as orchestrator;
#[doc(hidden)]
pub use handoffcheck_utils::{error, exit_codes, logging, ring_buffer, trace_id};
#[doc(hidden)]
pub use handoffcheck_validation as validation;

#[doc(hidden)]
pub mod cli;

/// Emit a value as JCS-canonical JSON (RFC 8785).
///
/// Used for every `--json` output so that reports diff cleanly.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String, HandoffCheckError> {
    let json_value = serde_json::to_value(value)?;
    let bytes = serde_json_canonicalizer::to_vec(&json_value).map_err(|e| {
        HandoffCheckError::InvalidInput(format!("Failed to canonicalize JSON: {e}"))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        HandoffCheckError::InvalidInput(format!("Canonical JSON contained invalid UTF-8: {e}"))
    })
}

/// Stands in for a real backend when correction is disabled
struct CorrectionDisabled;

#[async_trait]
impl LlmBackend for CorrectionDisabled {
    async fn invoke(&self, _invocation: LlmInvocation) -> Result<LlmResult, LlmError> {
        Err(LlmError::Unsupported(
            "AI correction is disabled for this validator".to_string(),
        ))
    }
}

/// Build a validator wired to the configured backend and a fresh monitor.
///
/// The backend is only constructed when `config.validation.allow_correction`
/// is set, so validation-only use needs no API key.
///
/// # Errors
///
/// Returns `HandoffCheckError::Llm` when the backend cannot be constructed.
pub fn build_validator(config: &Config) -> Result<HandoffValidator, HandoffCheckError> {
    let backend: Arc<dyn LlmBackend> = if config.validation.allow_correction {
        Arc::from(handoffcheck_llm::from_config(config)?)
    } else {
        Arc::new(CorrectionDisabled)
    };
    Ok(build_validator_with_backend(config, backend))
}

/// Build a validator around an existing backend
#[must_use]
pub fn build_validator_with_backend(config: &Config, backend: Arc<dyn LlmBackend>) -> HandoffValidator {
    let settings = CorrectorSettings {
        max_attempts: config.validation.max_retry_attempts,
        model: handoffcheck_llm::effective_model(config),
        call_timeout: config
            .llm
            .timeout_secs
            .map_or(handoffcheck_llm::DEFAULT_TIMEOUT, std::time::Duration::from_secs),
        ..CorrectorSettings::default()
    };
    let corrector = Arc::new(AiCorrector::with_settings(backend, settings));
    let monitor = Arc::new(ValidationMonitor::new(MonitorSettings::from(&config.monitor)));
    HandoffValidator::new(corrector, monitor, HandoffSettings::from(config))
}

/// CLI exit code for a finished handoff
#[must_use]
pub fn exit_code_for(report: &HandoffReport) -> ExitCode {
    match report.final_state {
        HandoffState::Valid | HandoffState::Corrected => ExitCode::SUCCESS,
        HandoffState::Failed(FailureReason::AttemptsExhausted) => ExitCode::CORRECTION_FAILED,
        HandoffState::Failed(FailureReason::Timeout) => ExitCode::TIMEOUT,
        _ => ExitCode::VALIDATION_FAILED,
    }
}
