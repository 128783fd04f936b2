//! AI correction of invalid handoff payloads
//!
//! Builds a repair prompt from the contract description and the validator's
//! suggestions, sends it to an [`LlmBackend`](handoffcheck_llm::LlmBackend),
//! and extracts a candidate JSON object from the reply. Attempts are bounded
//! per trace id.

mod corrector;
mod extract;
mod prompt;

pub use corrector::{
    AiCorrector, CorrectionFailure, CorrectionStats, CorrectorSettings,
    DEFAULT_MAX_TRACKED_TRACES,
};
pub use extract::extract_json_object;
pub use prompt::{SYSTEM_PROMPT, build_correction_prompt};
