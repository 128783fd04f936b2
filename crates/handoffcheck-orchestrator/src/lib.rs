//! Handoff validation with bounded AI correction
//!
//! [`HandoffValidator`] runs the specialist validator for a handoff boundary
//! and, when allowed, loops rejected payloads through an
//! [`AiCorrector`](handoffcheck_corrector::AiCorrector) until a candidate
//! passes, the attempts run out, or the deadline expires. Every outcome is
//! reported to the shared
//! [`ValidationMonitor`](handoffcheck_monitor::ValidationMonitor).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use handoffcheck_contracts::HandoffType;
//! use handoffcheck_corrector::AiCorrector;
//! use handoffcheck_monitor::ValidationMonitor;
//! use handoffcheck_orchestrator::{HandoffSettings, HandoffValidator};
//!
//! # async fn run(backend: Arc<dyn handoffcheck_llm::LlmBackend>, payload: serde_json::Value) {
//! let validator = HandoffValidator::new(
//!     Arc::new(AiCorrector::new(backend)),
//!     Arc::new(ValidationMonitor::default()),
//!     HandoffSettings::default(),
//! );
//! let result = validator
//!     .validate(&payload, HandoffType::ContentToDesign, true)
//!     .await;
//! println!("valid: {}", result.is_valid);
//! # }
//! ```

mod settings;
mod state;
mod validator;

pub use settings::HandoffSettings;
pub use state::{FailureReason, HandoffEvent, HandoffState, TransitionError, transition};
pub use validator::{HandoffReport, HandoffValidator};
