//! End-to-end handoff scenarios through the public library API
//!
//! Each test wires a `HandoffValidator` to a scripted backend, so no network
//! access or API key is needed.

use async_trait::async_trait;
use handoffcheck::llm::LlmError;
use handoffcheck::monitor::CriticalEventType;
use handoffcheck::{
    AiCorrector, Config, ErrorType, ExitCode, FailureReason, HandoffState, HandoffType,
    LlmBackend, LlmInvocation, LlmResult, Severity, build_validator, build_validator_with_backend,
    exit_code_for,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fixture(name: &str) -> Value {
    let text = match name {
        "content_valid" => include_str!("fixtures/content_valid.json"),
        "content_empty_copy" => include_str!("fixtures/content_empty_copy.json"),
        "quality_spammy" => include_str!("fixtures/quality_spammy.json"),
        "delivery_oversized" => include_str!("fixtures/delivery_oversized.json"),
        other => panic!("unknown fixture {other}"),
    };
    serde_json::from_str(text).unwrap()
}

/// Returns the same response to every call and remembers the prompts
struct ScriptedBackend {
    response: Result<String, ()>,
    delay: Option<Duration>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(text.into()),
            delay: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: Err(()),
            delay: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response: Ok("{}".to_string()),
            delay: Some(delay),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, invocation: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(invocation.user_text());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Ok(text) => Ok(LlmResult::new(text.clone(), "scripted", "scripted-model")),
            Err(()) => Err(LlmError::ProviderOutage("scripted outage".to_string())),
        }
    }
}

fn correcting_config() -> Config {
    Config::builder().allow_correction(true).build().unwrap()
}

#[tokio::test]
async fn scenario_empty_subject_and_cta_are_reported() {
    let config = Config::builder().build().unwrap();
    let validator = build_validator(&config).unwrap();

    let result = validator
        .validate(&fixture("content_empty_copy"), HandoffType::ContentToDesign, false)
        .await;

    assert!(!result.is_valid);
    let critical: Vec<_> = result.critical_errors().collect();
    assert!(critical.len() >= 2, "{critical:?}");
    assert!(critical.iter().any(|e| e.field.ends_with("subject")));
    assert!(critical.iter().any(|e| e.field.ends_with("cta")));
    assert!(result.correction_suggestions.len() >= 2);
    assert!(result.validated_data.is_none());
}

#[tokio::test]
async fn scenario_spam_score_is_corrected() {
    let mut repaired = fixture("quality_spammy");
    repaired["spam_analysis"]["spam_score"] = json!(1);
    let backend = ScriptedBackend::replying(format!(
        "Here is the fix:\n```json\n{}\n```",
        serde_json::to_string_pretty(&repaired).unwrap()
    ));
    let validator = build_validator_with_backend(&correcting_config(), backend.clone());

    let payload = fixture("quality_spammy");
    let rejected = validator
        .validate(&payload, HandoffType::QualityToDelivery, false)
        .await;
    assert!(!rejected.is_valid);
    assert!(
        rejected
            .errors
            .iter()
            .any(|e| e.field == "spam_analysis.spam_score" && e.severity == Severity::Critical)
    );
    assert_eq!(backend.calls(), 0);

    let report = validator
        .validate_with_report(&payload, HandoffType::QualityToDelivery, true)
        .await
        .unwrap();
    assert_eq!(report.final_state, HandoffState::Corrected);
    assert_eq!(report.correction_attempts, 1);
    assert_eq!(report.trace_id, "quality-1700000000000-abcd");
    assert!(report.result.is_valid);
    assert_eq!(report.result.validated_data, Some(repaired));
    assert_eq!(exit_code_for(&report), ExitCode::SUCCESS);

    let prompts = backend.prompts.lock().unwrap();
    assert!(prompts[0].contains("spam_analysis.spam_score"));
    assert!(prompts[0].contains("attempt 1 of 3"));
}

#[tokio::test]
async fn scenario_unusable_backend_is_called_exactly_three_times() {
    let backend = ScriptedBackend::replying("Invalid response");
    let corrector = AiCorrector::new(backend.clone());
    let payload = fixture("content_empty_copy");
    let suggestions = {
        let config = Config::builder().build().unwrap();
        build_validator(&config)
            .unwrap()
            .validate(&payload, HandoffType::ContentToDesign, false)
            .await
            .correction_suggestions
    };
    for _ in 0..3 {
        let corrected = corrector
            .correct_data("content-1700000000000-0001", &payload, &suggestions, HandoffType::ContentToDesign)
            .await;
        assert!(corrected.is_none());
    }
    assert_eq!(backend.calls(), 3);

    let backend = ScriptedBackend::replying("Invalid response");
    let validator = build_validator_with_backend(&correcting_config(), backend.clone());
    let report = validator
        .validate_with_report(&payload, HandoffType::ContentToDesign, true)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 3);
    assert!(!report.result.is_valid);
    assert!(report.result.validated_data.is_none());
    assert_eq!(
        report.final_state,
        HandoffState::Failed(FailureReason::AttemptsExhausted)
    );
    assert_eq!(exit_code_for(&report), ExitCode::CORRECTION_FAILED);
    assert_eq!(validator.corrector().attempts_for(&report.trace_id), 0);

    let metrics = validator.monitor().get_metrics();
    assert_eq!(metrics.total_validations, 1);
    assert_eq!(metrics.failed_validations, 1);
    assert_eq!(metrics.total_corrections, 1);
    assert_eq!(metrics.successful_corrections, 0);
}

#[tokio::test]
async fn scenario_oversized_delivery_package() {
    let config = Config::builder().build().unwrap();
    let validator = build_validator(&config).unwrap();

    let result = validator.validate_package(&fixture("delivery_oversized"));

    assert!(!result.is_valid);
    let size_error = result
        .errors
        .iter()
        .find(|e| e.error_type == ErrorType::SizeLimit)
        .expect("size_limit error");
    assert_eq!(size_error.field, "total_size_bytes");
    assert_eq!(size_error.severity, Severity::Critical);
}

#[tokio::test]
async fn valid_payload_passes_without_backend_call() {
    let backend = ScriptedBackend::replying("{}");
    let validator = build_validator_with_backend(&correcting_config(), backend.clone());
    let payload = fixture("content_valid");

    let report = validator
        .validate_with_report(&payload, HandoffType::ContentToDesign, true)
        .await
        .unwrap();

    assert_eq!(report.final_state, HandoffState::Valid);
    assert_eq!(report.result.validated_data, Some(payload));
    assert_eq!(report.correction_attempts, 0);
    assert_eq!(backend.calls(), 0);
    assert_eq!(validator.monitor().get_metrics().successful_validations, 1);
}

#[tokio::test]
async fn backend_outage_raises_correction_failure_events() {
    let backend = ScriptedBackend::failing();
    let validator = build_validator_with_backend(&correcting_config(), backend.clone());

    let report = validator
        .validate_with_report(&fixture("content_empty_copy"), HandoffType::ContentToDesign, true)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 3);
    assert_eq!(
        report.final_state,
        HandoffState::Failed(FailureReason::AttemptsExhausted)
    );
    let events = validator.monitor().critical_events(false);
    assert!(!events.is_empty());
    assert!(
        events
            .iter()
            .all(|e| e.event_type == CriticalEventType::CorrectionFailure)
    );
}

#[tokio::test]
async fn deadline_abandons_slow_backend() {
    let config = Config::builder()
        .allow_correction(true)
        .max_validation_time_ms(150)
        .build()
        .unwrap();
    let backend = ScriptedBackend::slow(Duration::from_secs(10));
    let validator = build_validator_with_backend(&config, backend.clone());

    let started = std::time::Instant::now();
    let report = validator
        .validate_with_report(&fixture("content_empty_copy"), HandoffType::ContentToDesign, true)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.final_state, HandoffState::Failed(FailureReason::Timeout));
    assert_eq!(report.failure_reason, Some(FailureReason::Timeout));
    assert_eq!(backend.calls(), 1);
    assert_eq!(exit_code_for(&report), ExitCode::TIMEOUT);
    assert!(
        validator
            .monitor()
            .critical_events(false)
            .iter()
            .any(|e| e.event_type == CriticalEventType::Timeout)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_handoffs_keep_separate_attempt_counters() {
    let backend = ScriptedBackend::replying("Invalid response");
    let validator = Arc::new(build_validator_with_backend(&correcting_config(), backend.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let validator = Arc::clone(&validator);
        handles.push(tokio::spawn(async move {
            let mut payload = fixture("content_empty_copy");
            payload["trace_id"] = json!(format!("content-1700000000000-{i:04}"));
            validator
                .validate_with_report(&payload, HandoffType::ContentToDesign, true)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.correction_attempts, 3);
    }

    assert_eq!(backend.calls(), 24);
    assert_eq!(validator.monitor().get_metrics().total_validations, 8);
    assert_eq!(validator.corrector().get_correction_stats().active_corrections, 0);
}
