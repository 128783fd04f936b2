use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, error, warn};

use handoffcheck_contracts::{
    ContractKind, ErrorType, HandoffPayload, HandoffType, Severity, ValidationError,
    ValidationResult,
};
use handoffcheck_corrector::{AiCorrector, CorrectionFailure};
use handoffcheck_monitor::{CriticalEventType, NewCriticalEvent, ValidationEvent, ValidationMonitor};
use handoffcheck_utils::logging::{handoff_span, log_validation_complete, log_validation_start};
use handoffcheck_utils::trace_id::{generate_trace_id, is_valid_trace_id};
use handoffcheck_validation::{validator_for, validator_for_contract};

use crate::settings::HandoffSettings;
use crate::state::{FailureReason, HandoffEvent, HandoffState, TransitionError, transition};

/// Outcome of one handoff validation with its lifecycle details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoffReport {
    pub result: ValidationResult,
    pub final_state: HandoffState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Correction attempts started, including ones that produced nothing
    pub correction_attempts: u32,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// The payload's trace id, or a generated one when it had none
    pub trace_id: String,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Validates handoffs and drives bounded AI correction of rejected payloads.
///
/// Shared by reference across concurrent handoffs. Each call reports exactly
/// one validation to the monitor it was constructed with.
pub struct HandoffValidator {
    corrector: Arc<AiCorrector>,
    monitor: Arc<ValidationMonitor>,
    settings: HandoffSettings,
    /// Sequence for per-run correction ledger keys
    runs: AtomicU64,
}

impl HandoffValidator {
    pub fn new(
        corrector: Arc<AiCorrector>,
        monitor: Arc<ValidationMonitor>,
        settings: HandoffSettings,
    ) -> Self {
        Self {
            corrector,
            monitor,
            settings,
            runs: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &HandoffSettings {
        &self.settings
    }

    #[must_use]
    pub fn monitor(&self) -> &Arc<ValidationMonitor> {
        &self.monitor
    }

    #[must_use]
    pub fn corrector(&self) -> &Arc<AiCorrector> {
        &self.corrector
    }

    /// Validate `payload` for `handoff_type`, correcting it when allowed
    pub async fn validate(
        &self,
        payload: &Value,
        handoff_type: HandoffType,
        allow_ai_correction: bool,
    ) -> ValidationResult {
        match self
            .validate_with_report(payload, handoff_type, allow_ai_correction)
            .await
        {
            Ok(report) => report.result,
            Err(e) => {
                error!(error = %e, "Handoff state machine rejected its own transition");
                ValidationResult::from_errors(
                    vec![ValidationError::critical(
                        "payload",
                        format!("Internal validation error: {e}"),
                        ErrorType::FormatInvalid,
                    )],
                    None,
                )
            }
        }
    }

    /// Validate an already typed payload
    pub async fn validate_payload(
        &self,
        payload: &HandoffPayload,
        allow_ai_correction: bool,
    ) -> ValidationResult {
        match payload.to_value() {
            Ok(value) => {
                self.validate(&value, payload.handoff_type(), allow_ai_correction)
                    .await
            }
            Err(e) => ValidationResult::from_errors(
                vec![ValidationError::critical(
                    "payload",
                    format!("Payload could not be serialized: {e}"),
                    ErrorType::FormatInvalid,
                )],
                None,
            ),
        }
    }

    /// Validate a delivery package. No correction is attempted.
    pub fn validate_package(&self, package: &Value) -> ValidationResult {
        let started = Instant::now();
        let result = validator_for_contract(ContractKind::DeliveryPackage).validate(package);
        self.monitor.record_validation(ValidationEvent {
            agent_id: self.settings.agent_id.clone(),
            agent_type: self
                .settings
                .agent_type
                .clone()
                .unwrap_or_else(|| "delivery".to_string()),
            success: result.is_valid,
            duration: started.elapsed(),
            validation_type: ContractKind::DeliveryPackage.as_str().to_string(),
            error_details: result.primary_error_type().map(|t| t.as_str().to_string()),
        });
        result
    }

    /// Full validation run returning the lifecycle report
    pub async fn validate_with_report(
        &self,
        payload: &Value,
        handoff_type: HandoffType,
        allow_ai_correction: bool,
    ) -> Result<HandoffReport, TransitionError> {
        let trace_id = payload
            .get("trace_id")
            .and_then(Value::as_str)
            .filter(|id| is_valid_trace_id(id))
            .map_or_else(
                || generate_trace_id(handoff_type.trace_prefix()),
                str::to_string,
            );
        let span = handoff_span(&trace_id, handoff_type.as_str());
        self.run(payload, handoff_type, allow_ai_correction, trace_id)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        payload: &Value,
        handoff_type: HandoffType,
        allow_ai_correction: bool,
        trace_id: String,
    ) -> Result<HandoffReport, TransitionError> {
        let started = Instant::now();
        let max = self.settings.max_attempts;
        let validator = validator_for(handoff_type);
        // Overlapping runs on one trace each get their own attempt budget
        let ledger_key = format!("{trace_id}#{}", self.runs.fetch_add(1, Ordering::Relaxed));
        log_validation_start(&trace_id, handoff_type.as_str(), allow_ai_correction);

        let mut state = transition(HandoffState::Pending, HandoffEvent::Start, max)?;
        let mut result = validator.validate(payload);
        let mut correction_attempts = 0;

        if result.is_valid {
            state = transition(state, HandoffEvent::Passed, max)?;
        } else {
            state = transition(state, HandoffEvent::Rejected, max)?;
            debug!(
                critical_errors = result.critical_count(),
                "Payload rejected by {} validator",
                handoff_type
            );
            if allow_ai_correction {
                state = transition(state, HandoffEvent::BeginCorrection, max)?;
            }
        }

        let mut baseline = payload.clone();
        while let HandoffState::Correcting { attempt } = state {
            correction_attempts = attempt;
            let remaining = self.settings.deadline.saturating_sub(started.elapsed());
            let outcome = if remaining.is_zero() {
                None
            } else {
                tokio::time::timeout(
                    remaining,
                    self.corrector.correct_keyed(
                        &ledger_key,
                        &trace_id,
                        &baseline,
                        &result.correction_suggestions,
                        handoff_type,
                    ),
                )
                .await
                .ok()
            };

            state = match outcome {
                None => {
                    self.report_timeout(&trace_id, handoff_type, attempt);
                    transition(state, HandoffEvent::DeadlineExceeded, max)?
                }
                Some(Err(failure)) => {
                    if let CorrectionFailure::Backend(e) = &failure {
                        self.monitor.record_critical_event(
                            NewCriticalEvent::new(
                                CriticalEventType::CorrectionFailure,
                                Severity::High,
                                format!(
                                    "Correction attempt {attempt} for {trace_id} failed: {e}"
                                ),
                            )
                            .with_agent(self.settings.agent_id.clone()),
                        );
                    }
                    warn!(attempt, error = %failure, "Correction attempt produced no candidate");
                    transition(state, HandoffEvent::NoCandidate, max)?
                }
                Some(Ok(candidate)) => {
                    let next = transition(state, HandoffEvent::CandidateReceived, max)?;
                    result = validator.validate(&candidate);
                    baseline = candidate;
                    let verdict = if result.is_valid {
                        HandoffEvent::Passed
                    } else {
                        debug!(
                            attempt,
                            critical_errors = result.critical_count(),
                            "Corrected candidate still invalid"
                        );
                        HandoffEvent::Rejected
                    };
                    transition(next, verdict, max)?
                }
            };
        }

        let failure_reason = match state {
            HandoffState::Failed(reason) => Some(reason),
            _ => None,
        };
        match failure_reason {
            Some(FailureReason::AttemptsExhausted) => result.warnings.push(format!(
                "AI correction failed after {correction_attempts} attempts"
            )),
            Some(FailureReason::Timeout) => result.warnings.push(format!(
                "Validation deadline of {} ms exceeded during correction",
                self.settings.deadline.as_millis()
            )),
            None => {}
        }

        let duration = started.elapsed();
        if correction_attempts > 0 {
            self.corrector.finish(&ledger_key);
        }
        self.finish(&trace_id, handoff_type, &result, state, correction_attempts, duration);

        Ok(HandoffReport {
            result,
            final_state: state,
            failure_reason,
            correction_attempts,
            duration,
            trace_id,
        })
    }

    fn report_timeout(&self, trace_id: &str, handoff_type: HandoffType, attempt: u32) {
        warn!(attempt, "Validation deadline exceeded, abandoning correction");
        self.monitor.record_critical_event(
            NewCriticalEvent::new(
                CriticalEventType::Timeout,
                Severity::High,
                format!(
                    "{handoff_type} validation of {trace_id} exceeded {} ms during correction attempt {attempt}",
                    self.settings.deadline.as_millis()
                ),
            )
            .with_agent(self.settings.agent_id.clone()),
        );
    }

    fn finish(
        &self,
        trace_id: &str,
        handoff_type: HandoffType,
        result: &ValidationResult,
        state: HandoffState,
        correction_attempts: u32,
        duration: Duration,
    ) {
        if correction_attempts > 0 {
            self.monitor
                .record_correction(&self.settings.agent_id, state == HandoffState::Corrected);
        }

        let error_details = match state {
            HandoffState::Failed(FailureReason::Timeout) => Some("timeout".to_string()),
            _ => result.primary_error_type().map(|t| t.as_str().to_string()),
        };
        self.monitor.record_validation(ValidationEvent {
            agent_id: self.settings.agent_id.clone(),
            agent_type: self
                .settings
                .agent_type
                .clone()
                .unwrap_or_else(|| handoff_type.trace_prefix().to_string()),
            success: result.is_valid,
            duration,
            validation_type: handoff_type.as_str().to_string(),
            error_details: if result.is_valid { None } else { error_details },
        });

        log_validation_complete(trace_id, state.as_str(), duration.as_millis(), result.is_valid);
    }
}
