//! Validation verdict types shared by every validator

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How strongly a finding blocks the handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the handoff
    Critical,
    High,
    Medium,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    SizeLimit,
    MissingField,
    TypeMismatch,
    Range,
    FormatInvalid,
    Compliance,
}

impl ErrorType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SizeLimit => "size_limit",
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::Range => "range",
            Self::FormatInvalid => "format_invalid",
            Self::Compliance => "compliance",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `content_package.complete_content.subject`
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub error_type: ErrorType,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        error_type: ErrorType,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
            error_type,
        }
    }

    pub fn critical(field: impl Into<String>, message: impl Into<String>, error_type: ErrorType) -> Self {
        Self::new(field, message, Severity::Critical, error_type)
    }

    pub fn medium(field: impl Into<String>, message: impl Into<String>, error_type: ErrorType) -> Self {
        Self::new(field, message, Severity::Medium, error_type)
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Urgency of a correction suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::High,
            Severity::High => Self::Medium,
            Severity::Medium => Self::Low,
        }
    }
}

/// Repair instruction derived from one `ValidationError`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionSuggestion {
    pub field: String,
    pub issue: String,
    pub suggestion: String,
    /// Inserted verbatim into the correction prompt
    pub correction_prompt: String,
    pub priority: Priority,
}

impl CorrectionSuggestion {
    #[must_use]
    pub fn from_error(error: &ValidationError) -> Self {
        let field = error.field.as_str();
        let suggestion = match error.error_type {
            ErrorType::MissingField => format!("Provide a non-empty value for '{field}'"),
            ErrorType::TypeMismatch => format!("Use the type the contract requires for '{field}'"),
            ErrorType::Range => format!("Bring '{field}' within its allowed range"),
            ErrorType::SizeLimit => format!("Reduce the size of '{field}' below the limit"),
            ErrorType::FormatInvalid => format!("Repair the structure of '{field}'"),
            ErrorType::Compliance => format!("Adjust '{field}' so it meets the required threshold"),
        };
        let correction_prompt = format!(
            "Fix field '{}' ({}, {}): {}. {}.",
            field, error.error_type, error.severity, error.message, suggestion
        );
        Self {
            field: error.field.clone(),
            issue: error.message.clone(),
            suggestion,
            correction_prompt,
            priority: error.severity.into(),
        }
    }
}

/// Verdict for one payload
///
/// `is_valid` holds exactly when no error is critical. `validated_data` is
/// present only for valid results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub correction_suggestions: Vec<CorrectionSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_data: Option<Value>,
}

impl ValidationResult {
    /// Build a verdict from the full error list.
    ///
    /// Non-critical errors are mirrored into `warnings` and every error gets
    /// one correction suggestion. `data` is kept only if the result is valid.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>, data: Option<Value>) -> Self {
        let is_valid = !errors.iter().any(ValidationError::is_critical);
        let warnings = errors
            .iter()
            .filter(|e| !e.is_critical())
            .map(ToString::to_string)
            .collect();
        let correction_suggestions = errors.iter().map(CorrectionSuggestion::from_error).collect();
        Self {
            is_valid,
            errors,
            warnings,
            correction_suggestions,
            validated_data: if is_valid { data } else { None },
        }
    }

    /// Verdict for input that is not a JSON object at all
    #[must_use]
    pub fn not_an_object(value: &Value) -> Self {
        let kind = match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        Self::from_errors(
            vec![ValidationError::critical(
                "payload",
                format!("Payload must be a JSON object, got {kind}"),
                ErrorType::TypeMismatch,
            )],
            None,
        )
    }

    pub fn critical_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.is_critical())
    }

    #[must_use]
    pub fn critical_count(&self) -> usize {
        self.critical_errors().count()
    }

    /// Type of the first critical error (or first error), for monitor reporting
    #[must_use]
    pub fn primary_error_type(&self) -> Option<ErrorType> {
        self.critical_errors()
            .next()
            .or_else(|| self.errors.first())
            .map(|e| e.error_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_from_errors_valid_when_no_critical() {
        let result = ValidationResult::from_errors(
            vec![ValidationError::medium(
                "content_package.complete_content.preheader",
                "Preheader is empty",
                ErrorType::MissingField,
            )],
            Some(json!({"a": 1})),
        );
        assert!(result.is_valid);
        assert_eq!(result.validated_data, Some(json!({"a": 1})));
        assert_eq!(
            result.warnings,
            vec!["content_package.complete_content.preheader: Preheader is empty".to_string()]
        );
        assert_eq!(result.correction_suggestions.len(), 1);
        assert_eq!(result.correction_suggestions[0].priority, Priority::Low);
    }

    #[test]
    fn test_from_errors_drops_data_when_invalid() {
        let result = ValidationResult::from_errors(
            vec![ValidationError::critical("trace_id", "missing", ErrorType::MissingField)],
            Some(json!({})),
        );
        assert!(!result.is_valid);
        assert!(result.validated_data.is_none());
        assert!(result.warnings.is_empty());
        assert_eq!(result.correction_suggestions[0].priority, Priority::High);
        assert_eq!(result.critical_count(), 1);
        assert_eq!(result.primary_error_type(), Some(ErrorType::MissingField));
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(Priority::from(Severity::Critical), Priority::High);
        assert_eq!(Priority::from(Severity::High), Priority::Medium);
        assert_eq!(Priority::from(Severity::Medium), Priority::Low);
    }

    #[test]
    fn test_suggestion_prompt_mentions_field_and_message() {
        let error = ValidationError::critical(
            "spam_analysis.spam_score",
            "Spam score 9 exceeds maximum of 3",
            ErrorType::Compliance,
        );
        let suggestion = CorrectionSuggestion::from_error(&error);
        assert!(suggestion.correction_prompt.contains("spam_analysis.spam_score"));
        assert!(suggestion.correction_prompt.contains("exceeds maximum of 3"));
        assert_eq!(suggestion.issue, error.message);
    }

    #[test]
    fn test_not_an_object() {
        for value in [json!(null), json!([]), json!(5), json!("x"), json!(true)] {
            let result = ValidationResult::not_an_object(&value);
            assert!(!result.is_valid);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.errors[0].field, "payload");
            assert_eq!(result.errors[0].error_type, ErrorType::TypeMismatch);
        }
    }

    #[test]
    fn test_serialized_shape_is_snake_case() {
        let result = ValidationResult::from_errors(
            vec![ValidationError::critical("html", "too big", ErrorType::SizeLimit)],
            None,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["is_valid"], json!(false));
        assert_eq!(value["errors"][0]["error_type"], json!("size_limit"));
        assert_eq!(value["errors"][0]["severity"], json!("critical"));
        assert!(value.get("validated_data").is_none());
    }

    fn arb_error() -> impl Strategy<Value = ValidationError> {
        let severity = prop_oneof![
            Just(Severity::Critical),
            Just(Severity::High),
            Just(Severity::Medium),
        ];
        let error_type = prop_oneof![
            Just(ErrorType::SizeLimit),
            Just(ErrorType::MissingField),
            Just(ErrorType::TypeMismatch),
            Just(ErrorType::Range),
            Just(ErrorType::FormatInvalid),
            Just(ErrorType::Compliance),
        ];
        ("[a-z_.]{1,20}", severity, error_type)
            .prop_map(|(field, severity, error_type)| {
                ValidationError::new(field, "finding", severity, error_type)
            })
    }

    proptest! {
        #[test]
        fn prop_verdict_follows_critical_errors(
            errors in prop::collection::vec(arb_error(), 0..12),
        ) {
            let critical = errors.iter().filter(|e| e.severity == Severity::Critical).count();
            let result = ValidationResult::from_errors(errors.clone(), Some(json!({"k": 1})));

            prop_assert_eq!(result.is_valid, critical == 0);
            prop_assert_eq!(result.critical_count(), critical);
            prop_assert_eq!(result.warnings.len(), errors.len() - critical);
            prop_assert_eq!(result.correction_suggestions.len(), errors.len());
            prop_assert_eq!(result.validated_data.is_some(), result.is_valid);
        }
    }
}
