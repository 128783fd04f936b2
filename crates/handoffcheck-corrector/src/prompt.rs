use handoffcheck_contracts::{CorrectionSuggestion, HandoffType, contract_description};
use serde_json::Value;

/// System message sent with every correction request
pub const SYSTEM_PROMPT: &str = "You repair JSON payloads exchanged between stages of an email \
production pipeline. You change only what is needed to satisfy the contract, keep every other \
field as it is, and answer with a single JSON object.";

/// Build the user prompt for one correction attempt.
#[must_use]
pub fn build_correction_prompt(
    payload: &Value,
    suggestions: &[CorrectionSuggestion],
    handoff_type: HandoffType,
    attempt: u32,
    max_attempts: u32,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "A {handoff_type} handoff payload failed validation (correction attempt {attempt} of {max_attempts}).\n\n"
    ));

    prompt.push_str("## Contract\n\n");
    prompt.push_str(&contract_description(handoff_type.into()));
    prompt.push_str("\n\n");

    prompt.push_str("## Problems to fix\n\n");
    if suggestions.is_empty() {
        prompt.push_str("- Make the payload satisfy every contract rule above.\n");
    }
    for (i, suggestion) in suggestions.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [{}] {}\n",
            i + 1,
            suggestion.priority,
            suggestion.correction_prompt
        ));
    }
    prompt.push('\n');

    prompt.push_str("## Current payload\n\n```json\n");
    prompt.push_str(&serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()));
    prompt.push_str("\n```\n\n");

    prompt.push_str(
        "## Instructions\n\n\
         - Keep trace_id and timestamp unchanged.\n\
         - Preserve all fields that are already valid.\n\
         - Return ONLY the corrected JSON object. No explanations, no markdown outside the JSON.\n",
    );

    prompt
}
