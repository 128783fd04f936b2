use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use handoffcheck_contracts::limits::MAX_RETRY_ATTEMPTS;
use handoffcheck_contracts::{CorrectionSuggestion, HandoffType};
use handoffcheck_llm::{DEFAULT_TIMEOUT, LlmBackend, LlmError, LlmInvocation, Message};
use handoffcheck_utils::logging::log_correction_attempt;

use crate::extract::extract_json_object;
use crate::prompt::{SYSTEM_PROMPT, build_correction_prompt};

/// Traces whose attempt counters are kept before the oldest is dropped
pub const DEFAULT_MAX_TRACKED_TRACES: usize = 1024;

/// Why a correction attempt produced no candidate
#[derive(Debug, Error)]
pub enum CorrectionFailure {
    #[error("correction backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("backend response did not contain a JSON object: {preview}")]
    Unparsable { preview: String },

    #[error("trace {trace_id} already used {attempts} correction attempts")]
    AttemptLimitReached { trace_id: String, attempts: u32 },
}

/// Corrector tuning
#[derive(Debug, Clone)]
pub struct CorrectorSettings {
    /// Attempts allowed per trace
    pub max_attempts: u32,
    pub max_tracked_traces: usize,
    /// Model passed to the backend; empty uses the backend default
    pub model: String,
    /// Timeout handed to the backend for each call
    pub call_timeout: Duration,
}

impl Default for CorrectorSettings {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_ATTEMPTS,
            max_tracked_traces: DEFAULT_MAX_TRACKED_TRACES,
            model: String::new(),
            call_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Snapshot of attempt bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CorrectionStats {
    /// Traces with at least one recorded attempt
    pub active_corrections: usize,
    /// Attempts summed over those traces
    pub total_attempts: u64,
}

#[derive(Debug, Default)]
struct AttemptLedger {
    attempts: HashMap<String, u32>,
    /// Insertion order for eviction
    order: VecDeque<String>,
}

impl AttemptLedger {
    /// Claim the next attempt number for `trace_id`, or `None` when exhausted
    fn claim(&mut self, trace_id: &str, max_attempts: u32, capacity: usize) -> Option<u32> {
        if let Some(count) = self.attempts.get_mut(trace_id) {
            if *count >= max_attempts {
                return None;
            }
            *count += 1;
            return Some(*count);
        }

        while self.order.len() >= capacity.max(1) {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.attempts.remove(&oldest);
                    debug!(trace_id = %oldest, "Evicted oldest correction counter");
                }
                None => break,
            }
        }
        if max_attempts == 0 {
            return None;
        }
        self.attempts.insert(trace_id.to_string(), 1);
        self.order.push_back(trace_id.to_string());
        Some(1)
    }

    fn remove(&mut self, trace_id: &str) {
        if self.attempts.remove(trace_id).is_some() {
            self.order.retain(|t| t != trace_id);
        }
    }
}

/// Repairs invalid payloads through a generative backend.
///
/// Attempt counters are keyed by trace id, or by a caller-chosen key through
/// [`correct_keyed`](Self::correct_keyed), so concurrent handoffs never share
/// a budget. Each correction call consumes one attempt, whether or not the
/// backend succeeds.
pub struct AiCorrector {
    backend: Arc<dyn LlmBackend>,
    settings: CorrectorSettings,
    ledger: Mutex<AttemptLedger>,
}

impl AiCorrector {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self::with_settings(backend, CorrectorSettings::default())
    }

    pub fn with_settings(backend: Arc<dyn LlmBackend>, settings: CorrectorSettings) -> Self {
        Self {
            backend,
            settings,
            ledger: Mutex::new(AttemptLedger::default()),
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.settings.max_attempts
    }

    fn ledger(&self) -> MutexGuard<'_, AttemptLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the backend for a corrected payload.
    ///
    /// The returned candidate is a JSON object; it has not been validated.
    /// Missing `trace_id`/`timestamp` are copied over from `payload`.
    pub async fn correct(
        &self,
        trace_id: &str,
        payload: &Value,
        suggestions: &[CorrectionSuggestion],
        handoff_type: HandoffType,
    ) -> Result<Value, CorrectionFailure> {
        self.correct_keyed(trace_id, trace_id, payload, suggestions, handoff_type)
            .await
    }

    /// Like [`correct`](Self::correct), with attempts counted under `key`.
    ///
    /// Runs that may overlap on one trace pass distinct keys; logs and backend
    /// calls still carry `trace_id`. Release the key with [`finish`](Self::finish).
    pub async fn correct_keyed(
        &self,
        key: &str,
        trace_id: &str,
        payload: &Value,
        suggestions: &[CorrectionSuggestion],
        handoff_type: HandoffType,
    ) -> Result<Value, CorrectionFailure> {
        let max = self.settings.max_attempts;
        let claimed = self
            .ledger()
            .claim(key, max, self.settings.max_tracked_traces);
        let Some(attempt) = claimed else {
            warn!(trace_id, max_attempts = max, "Correction refused, attempts exhausted");
            return Err(CorrectionFailure::AttemptLimitReached {
                trace_id: trace_id.to_string(),
                attempts: max,
            });
        };

        log_correction_attempt(trace_id, attempt, max);

        let prompt = build_correction_prompt(payload, suggestions, handoff_type, attempt, max);
        let invocation = LlmInvocation::new(
            trace_id,
            "correction",
            self.settings.model.clone(),
            self.settings.call_timeout,
            vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_metadata("attempt", Value::from(attempt));

        let response = self.backend.invoke(invocation).await?;

        let Some(mut candidate) = extract_json_object(&response.raw_response) else {
            warn!(trace_id, attempt, "Correction response had no JSON object");
            return Err(CorrectionFailure::Unparsable {
                preview: preview(&response.raw_response),
            });
        };

        for key in ["trace_id", "timestamp"] {
            if !candidate.contains_key(key)
                && let Some(original) = payload.get(key)
            {
                candidate.insert(key.to_string(), original.clone());
            }
        }

        info!(
            trace_id,
            attempt,
            provider = %response.provider,
            "Correction candidate received"
        );
        Ok(Value::Object(candidate))
    }

    /// Like [`correct`](Self::correct), but "could not correct" is `None`.
    pub async fn correct_data(
        &self,
        trace_id: &str,
        payload: &Value,
        suggestions: &[CorrectionSuggestion],
        handoff_type: HandoffType,
    ) -> Option<Value> {
        match self.correct(trace_id, payload, suggestions, handoff_type).await {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                debug!(trace_id, error = %e, "No correction produced");
                None
            }
        }
    }

    /// Attempts recorded for one trace or ledger key
    #[must_use]
    pub fn attempts_for(&self, key: &str) -> u32 {
        self.ledger().attempts.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn get_correction_stats(&self) -> CorrectionStats {
        let ledger = self.ledger();
        CorrectionStats {
            active_corrections: ledger.attempts.len(),
            total_attempts: ledger.attempts.values().map(|&n| u64::from(n)).sum(),
        }
    }

    /// Drop every attempt counter
    pub fn clear_correction_history(&self) {
        let mut ledger = self.ledger();
        ledger.attempts.clear();
        ledger.order.clear();
    }

    /// Drop the counter of a trace or key that reached a terminal state
    pub fn finish(&self, key: &str) {
        self.ledger().remove(key);
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(MAX).collect::<String>())
    }
}
