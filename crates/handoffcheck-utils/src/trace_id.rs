//! Trace identifiers
//!
//! A trace id has the shape `<prefix>-<epoch>-<suffix>`:
//! - `prefix`: lowercase identifier (`[a-z][a-z0-9_]*`)
//! - `epoch`: 10 to 13 digits (unix seconds or milliseconds)
//! - `suffix`: at least 4 lowercase alphanumerics

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

static TRACE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*-[0-9]{10,13}-[a-z0-9]{4,}$")
        .expect("trace id pattern is valid")
});

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 8;

/// Returns true when `value` is a well-formed trace id.
#[must_use]
pub fn is_valid_trace_id(value: &str) -> bool {
    TRACE_ID_PATTERN.is_match(value)
}

/// Generate a fresh trace id using the current time in milliseconds.
///
/// `prefix` is lowercased and any character outside `[a-z0-9_]` becomes `_`.
/// An empty prefix becomes `trace`.
#[must_use]
pub fn generate_trace_id(prefix: &str) -> String {
    let mut clean: String = prefix
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !clean.starts_with(|c: char| c.is_ascii_lowercase()) {
        clean.insert(0, 't');
    }
    if clean == "t" {
        clean = "trace".to_string();
    }

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}-{}-{}", clean, Utc::now().timestamp_millis(), suffix)
}
