//! Rule accumulator shared by the specialist validators
//!
//! Every check appends to one error list and returns the extracted value (if
//! any) so later rules can build on it. Nothing short-circuits.

use chrono::{DateTime, NaiveDateTime};
use handoffcheck_contracts::{ErrorType, Severity, ValidationError, ValidationResult};
use handoffcheck_utils::trace_id::is_valid_trace_id;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub(crate) struct Rules<'a> {
    root: &'a Map<String, Value>,
    errors: Vec<ValidationError>,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'a> Rules<'a> {
    pub(crate) fn new(root: &'a Map<String, Value>) -> Self {
        Self {
            root,
            errors: Vec::new(),
        }
    }

    pub(crate) fn error(
        &mut self,
        field: &str,
        message: impl Into<String>,
        severity: Severity,
        error_type: ErrorType,
    ) {
        self.errors
            .push(ValidationError::new(field, message, severity, error_type));
    }

    /// Resolve a dotted path from the payload root
    pub(crate) fn lookup(&self, path: &str) -> Option<&'a Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Present, non-null value or a `missing_field` error
    fn present(&mut self, path: &str, severity: Severity) -> Option<&'a Value> {
        match self.lookup(path) {
            Some(Value::Null) | None => {
                self.error(
                    path,
                    format!("Required field '{path}' is missing"),
                    severity,
                    ErrorType::MissingField,
                );
                None
            }
            Some(value) => Some(value),
        }
    }

    fn mismatch(&mut self, path: &str, expected: &str, found: &Value, severity: Severity) {
        self.error(
            path,
            format!(
                "Field '{path}' must be a {expected}, found {}",
                type_name(found)
            ),
            severity,
            ErrorType::TypeMismatch,
        );
    }

    pub(crate) fn require_object(
        &mut self,
        path: &str,
        severity: Severity,
    ) -> Option<&'a Map<String, Value>> {
        let value = self.present(path, severity)?;
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.mismatch(path, "object", value, severity);
                None
            }
        }
    }

    /// Absent is fine; present-but-not-an-object is an error
    pub(crate) fn optional_object(
        &mut self,
        path: &str,
        severity: Severity,
    ) -> Option<&'a Map<String, Value>> {
        match self.lookup(path) {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                self.mismatch(path, "object", other, severity);
                None
            }
        }
    }

    /// Non-empty string; blank strings count as missing
    pub(crate) fn require_str(&mut self, path: &str, severity: Severity) -> Option<&'a str> {
        let value = self.present(path, severity)?;
        match value.as_str() {
            Some(s) if s.trim().is_empty() => {
                self.error(
                    path,
                    format!("Field '{path}' must not be empty"),
                    severity,
                    ErrorType::MissingField,
                );
                None
            }
            Some(s) => Some(s),
            None => {
                self.mismatch(path, "string", value, severity);
                None
            }
        }
    }

    pub(crate) fn optional_str(&mut self, path: &str, severity: Severity) -> Option<&'a str> {
        match self.lookup(path) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                self.mismatch(path, "string", other, severity);
                None
            }
        }
    }

    fn number_of(&mut self, path: &str, value: &Value, severity: Severity) -> Option<f64> {
        match value.as_f64() {
            Some(n) if n < 0.0 => {
                self.error(
                    path,
                    format!("Field '{path}' must not be negative, got {n}"),
                    severity,
                    ErrorType::Range,
                );
                None
            }
            Some(n) => Some(n),
            None => {
                self.mismatch(path, "number", value, severity);
                None
            }
        }
    }

    /// Non-negative number
    pub(crate) fn require_number(&mut self, path: &str, severity: Severity) -> Option<f64> {
        let value = self.present(path, severity)?;
        self.number_of(path, value, severity)
    }

    pub(crate) fn optional_number(&mut self, path: &str, severity: Severity) -> Option<f64> {
        match self.lookup(path) {
            None | Some(Value::Null) => None,
            Some(value) => self.number_of(path, value, severity),
        }
    }

    /// Optional non-negative whole number, such as a byte or word count
    pub(crate) fn optional_count(&mut self, path: &str, severity: Severity) -> Option<u64> {
        let n = self.optional_number(path, severity)?;
        if n.fract() != 0.0 {
            self.error(
                path,
                format!("Field '{path}' must be a whole number, got {n}"),
                severity,
                ErrorType::TypeMismatch,
            );
            return None;
        }
        Some(n as u64)
    }

    pub(crate) fn require_bool(&mut self, path: &str, severity: Severity) -> Option<bool> {
        let value = self.present(path, severity)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.mismatch(path, "boolean", value, severity);
                None
            }
        }
    }

    pub(crate) fn optional_bool(&mut self, path: &str, severity: Severity) -> Option<bool> {
        match self.lookup(path) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.mismatch(path, "boolean", other, severity);
                None
            }
        }
    }

    pub(crate) fn optional_array(&mut self, path: &str, severity: Severity) -> Option<&'a Vec<Value>> {
        match self.lookup(path) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                self.mismatch(path, "array", other, severity);
                None
            }
        }
    }

    /// Optional array whose elements must all be strings
    pub(crate) fn optional_strings(&mut self, path: &str, severity: Severity) -> Option<Vec<&'a str>> {
        let items = self.optional_array(path, severity)?;
        let mut strings = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => strings.push(s),
                None => self.mismatch(&format!("{path}.{i}"), "string", item, severity),
            }
        }
        Some(strings)
    }

    pub(crate) fn require_array(&mut self, path: &str, severity: Severity) -> Option<&'a Vec<Value>> {
        let value = self.present(path, severity)?;
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                self.mismatch(path, "array", value, severity);
                None
            }
        }
    }

    /// Score must lie on `0..=max`
    pub(crate) fn check_scale(&mut self, path: &str, value: f64, max: f64, severity: Severity) -> bool {
        if value > max {
            self.error(
                path,
                format!("Field '{path}' must be between 0 and {max}, got {value}"),
                severity,
                ErrorType::Range,
            );
            return false;
        }
        true
    }

    /// Character-count bounds
    pub(crate) fn check_chars(
        &mut self,
        path: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
        severity: Severity,
    ) {
        let count = value.chars().count();
        if let Some(min) = min
            && count < min
        {
            self.error(
                path,
                format!("Field '{path}' is {count} characters, minimum is {min}"),
                severity,
                ErrorType::Range,
            );
        }
        if let Some(max) = max
            && count > max
        {
            self.error(
                path,
                format!("Field '{path}' is {count} characters, maximum is {max}"),
                severity,
                ErrorType::Range,
            );
        }
    }

    pub(crate) fn check_one_of(&mut self, path: &str, value: &str, allowed: &[&str], severity: Severity) {
        if !allowed.contains(&value) {
            self.error(
                path,
                format!(
                    "Field '{path}' has invalid value '{value}' (expected one of: {})",
                    allowed.join(", ")
                ),
                severity,
                ErrorType::TypeMismatch,
            );
        }
    }

    /// `trace_id` and `timestamp` rules shared by every contract
    pub(crate) fn check_identity(&mut self) {
        if let Some(trace_id) = self.require_str("trace_id", Severity::Critical)
            && !is_valid_trace_id(trace_id)
        {
            self.error(
                "trace_id",
                format!("Trace id '{trace_id}' does not match <prefix>-<epoch>-<suffix>"),
                Severity::Critical,
                ErrorType::FormatInvalid,
            );
        }
        if let Some(timestamp) = self.require_str("timestamp", Severity::Critical)
            && !is_iso_timestamp(timestamp)
        {
            self.error(
                "timestamp",
                format!("Timestamp '{timestamp}' is not a valid ISO-8601 date-time"),
                Severity::Critical,
                ErrorType::FormatInvalid,
            );
        }
    }

    /// Copy carried forward from the content stage; every finding is cosmetic.
    ///
    /// With `expect_copy`, a blank or absent subject, body or cta is reported.
    pub(crate) fn check_original_content(&mut self, expect_copy: bool) {
        const BASE: &str = "original_content";
        if self.optional_object(BASE, Severity::Medium).is_none() {
            return;
        }
        for field in ["subject", "preheader", "body", "cta"] {
            let path = format!("{BASE}.{field}");
            let carried = match self.lookup(&path) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(other) => {
                    self.mismatch(&path, "string", other, Severity::Medium);
                    continue;
                }
            };
            if expect_copy && field != "preheader" && !carried {
                self.error(
                    &path,
                    format!("Original {field} was not carried forward"),
                    Severity::Medium,
                    ErrorType::MissingField,
                );
            }
        }
    }

    pub(crate) fn has_critical(&self) -> bool {
        self.errors.iter().any(ValidationError::is_critical)
    }

    /// Close out the rule run.
    ///
    /// A payload with no critical findings must also deserialize into its
    /// typed contract `T`; a failure there is reported as `format_invalid`.
    pub(crate) fn finish<T: DeserializeOwned>(mut self, value: &Value) -> ValidationResult {
        if !self.has_critical()
            && let Err(e) = serde_json::from_value::<T>(value.clone())
        {
            self.error(
                "payload",
                format!("Payload does not match the contract shape: {e}"),
                Severity::Critical,
                ErrorType::FormatInvalid,
            );
        }
        ValidationResult::from_errors(self.errors, Some(value.clone()))
    }
}

/// RFC 3339, or a naive ISO-8601 date-time without offset
pub(crate) fn is_iso_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules_for(value: &Value) -> Rules<'_> {
        Rules::new(value.as_object().unwrap())
    }

    #[test]
    fn test_lookup_dotted_path() {
        let value = json!({"a": {"b": {"c": 3}}});
        let rules = rules_for(&value);
        assert_eq!(rules.lookup("a.b.c"), Some(&json!(3)));
        assert_eq!(rules.lookup("a.x"), None);
        assert_eq!(rules.lookup("a.b.c.d"), None);
    }

    #[test]
    fn test_require_str_classifies_failures() {
        let value = json!({"empty": "  ", "num": 3, "ok": "yes"});
        let mut rules = rules_for(&value);
        assert_eq!(rules.require_str("ok", Severity::Critical), Some("yes"));
        assert_eq!(rules.require_str("empty", Severity::Critical), None);
        assert_eq!(rules.require_str("num", Severity::Medium), None);
        assert_eq!(rules.require_str("gone", Severity::Critical), None);

        let types: Vec<ErrorType> = rules.errors.iter().map(|e| e.error_type).collect();
        assert_eq!(
            types,
            vec![
                ErrorType::MissingField,
                ErrorType::TypeMismatch,
                ErrorType::MissingField
            ]
        );
        assert_eq!(rules.errors[1].severity, Severity::Medium);
        assert_eq!(rules.errors[2].field, "gone");
    }

    #[test]
    fn test_negative_number_is_range_error() {
        let value = json!({"score": -1});
        let mut rules = rules_for(&value);
        assert_eq!(rules.require_number("score", Severity::Critical), None);
        assert_eq!(rules.errors[0].error_type, ErrorType::Range);
    }

    #[test]
    fn test_optional_count_rejects_fractions() {
        let value = json!({"words": 13.5, "bytes": 2048, "gone": null});
        let mut rules = rules_for(&value);
        assert_eq!(rules.optional_count("bytes", Severity::Medium), Some(2048));
        assert_eq!(rules.optional_count("gone", Severity::Medium), None);
        assert_eq!(rules.optional_count("words", Severity::Medium), None);
        assert_eq!(rules.errors.len(), 1);
        assert_eq!(rules.errors[0].error_type, ErrorType::TypeMismatch);
        assert_eq!(rules.errors[0].severity, Severity::Medium);
    }

    #[test]
    fn test_optional_strings_reports_each_bad_element() {
        let value = json!({"triggers": ["free", 1, null]});
        let mut rules = rules_for(&value);
        assert_eq!(
            rules.optional_strings("triggers", Severity::Medium),
            Some(vec!["free"])
        );
        let fields: Vec<&str> = rules.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["triggers.1", "triggers.2"]);
    }

    #[test]
    fn test_original_content_findings_are_medium() {
        let value = json!({"original_content": {"subject": 5, "body": "Body", "cta": " "}});
        let mut rules = rules_for(&value);
        rules.check_original_content(true);
        let fields: Vec<(&str, ErrorType)> = rules
            .errors
            .iter()
            .map(|e| (e.field.as_str(), e.error_type))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("original_content.subject", ErrorType::TypeMismatch),
                ("original_content.cta", ErrorType::MissingField),
            ]
        );
        assert!(!rules.has_critical());
    }

    #[test]
    fn test_identity_checks() {
        let value = json!({"trace_id": "BAD", "timestamp": "yesterday"});
        let mut rules = rules_for(&value);
        rules.check_identity();
        assert_eq!(rules.errors.len(), 2);
        assert!(rules.errors.iter().all(|e| e.error_type == ErrorType::FormatInvalid));
    }

    #[test]
    fn test_iso_timestamp_forms() {
        assert!(is_iso_timestamp("2024-01-01T12:00:00Z"));
        assert!(is_iso_timestamp("2024-01-01T12:00:00.123Z"));
        assert!(is_iso_timestamp("2024-01-01T12:00:00+02:00"));
        assert!(is_iso_timestamp("2024-01-01T12:00:00"));
        assert!(!is_iso_timestamp("2024-13-01T12:00:00Z"));
        assert!(!is_iso_timestamp("not a date"));
    }

    #[test]
    fn test_check_chars_counts_unicode_scalars() {
        let value = json!({});
        let mut rules = rules_for(&value);
        rules.check_chars("subject", "ééé", None, Some(3), Severity::Critical);
        assert!(rules.errors.is_empty());
        rules.check_chars("subject", "éééé", None, Some(3), Severity::Critical);
        assert_eq!(rules.errors.len(), 1);
    }
}
