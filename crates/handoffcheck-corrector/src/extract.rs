//! Pull a JSON object candidate out of free-form model output

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").expect("fenced block pattern is valid")
});

/// Extract the corrected payload from a model response.
///
/// Tried in order: the first fenced code block (```json or bare ```), the
/// whole response, then the text between the first `{` and the last `}`.
/// Only a JSON object is accepted.
#[must_use]
pub fn extract_json_object(response: &str) -> Option<Map<String, Value>> {
    let fenced = FENCED_BLOCK
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    let braced = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&response[start..=end]),
        _ => None,
    };

    [fenced, Some(response), braced]
        .into_iter()
        .flatten()
        .find_map(parse_object)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
