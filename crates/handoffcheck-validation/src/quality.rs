use handoffcheck_contracts::limits::{
    ACCESSIBILITY_SCORE_TARGET, CLIENT_COMPATIBILITY_MIN, LOAD_TIME_TARGET_MS,
    OPTIMIZATION_SCORE_TARGET, QUALITY_SCORE_MIN, SPAM_SCORE_MAX, SPAM_SCORE_SCALE_MAX,
};
use handoffcheck_contracts::{
    ContractKind, ErrorType, HandoffType, QualityHandoff, Severity, ValidationResult,
};
use serde_json::Value;

use crate::SpecialistValidator;
use crate::rules::Rules;

const APPROVAL_STATUSES: &[&str] = &["approved", "needs_revision", "rejected"];
const RISK_LEVELS: &[&str] = &["low", "medium", "high"];

/// Validates quality-to-delivery handoffs (quality report gates)
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityValidator;

impl SpecialistValidator for QualityValidator {
    fn contract(&self) -> ContractKind {
        ContractKind::Handoff(HandoffType::QualityToDelivery)
    }

    fn validate(&self, output: &Value) -> ValidationResult {
        let Some(root) = output.as_object() else {
            return ValidationResult::not_an_object(output);
        };
        let mut rules = Rules::new(root);
        rules.check_identity();

        check_quality_package(&mut rules);
        check_test_results(&mut rules);
        check_accessibility(&mut rules);
        check_performance(&mut rules);
        check_spam(&mut rules);
        rules.check_original_content(false);

        rules.finish::<QualityHandoff>(output)
    }
}

/// Percentage score with a hard floor
fn gate_min(rules: &mut Rules<'_>, path: &str, label: &str, min: f64) {
    if let Some(score) = rules.require_number(path, Severity::Critical)
        && rules.check_scale(path, score, 100.0, Severity::Critical)
        && score < min
    {
        rules.error(
            path,
            format!("{label} {score} is below the required minimum of {min}"),
            Severity::Critical,
            ErrorType::Compliance,
        );
    }
}

/// Optional percentage score with a soft target
fn target_min(rules: &mut Rules<'_>, path: &str, label: &str, target: f64) {
    if let Some(score) = rules.optional_number(path, Severity::Medium)
        && rules.check_scale(path, score, 100.0, Severity::Medium)
        && score < target
    {
        rules.error(
            path,
            format!("{label} {score} is below the target of {target}"),
            Severity::Medium,
            ErrorType::Compliance,
        );
    }
}

fn check_quality_package(rules: &mut Rules<'_>) {
    if rules
        .require_object("quality_package", Severity::Critical)
        .is_none()
    {
        return;
    }
    gate_min(
        rules,
        "quality_package.quality_score",
        "Quality score",
        QUALITY_SCORE_MIN,
    );
    rules.optional_array("quality_package.quality_issues", Severity::Medium);
    if let Some(status) = rules.optional_str("quality_package.approval_status", Severity::Medium) {
        rules.check_one_of(
            "quality_package.approval_status",
            status,
            APPROVAL_STATUSES,
            Severity::Medium,
        );
    }
}

fn check_test_results(rules: &mut Rules<'_>) {
    if rules
        .require_object("test_results", Severity::Critical)
        .is_none()
    {
        return;
    }
    gate_min(
        rules,
        "test_results.client_compatibility_score",
        "Client compatibility score",
        CLIENT_COMPATIBILITY_MIN,
    );
    for (path, label) in [
        ("test_results.html_validation", "HTML validation"),
        ("test_results.css_validation", "CSS validation"),
    ] {
        if rules.optional_bool(path, Severity::High) == Some(false) {
            rules.error(
                path,
                format!("{label} reported failures"),
                Severity::High,
                ErrorType::Compliance,
            );
        }
    }
}

fn check_accessibility(rules: &mut Rules<'_>) {
    if rules
        .require_object("accessibility_report", Severity::Critical)
        .is_none()
    {
        return;
    }
    const WCAG: &str = "accessibility_report.wcag_aa_compliant";
    if rules.require_bool(WCAG, Severity::Critical) == Some(false) {
        rules.error(
            WCAG,
            "Email is not WCAG AA compliant",
            Severity::Critical,
            ErrorType::Compliance,
        );
    }
    target_min(
        rules,
        "accessibility_report.accessibility_score",
        "Accessibility score",
        ACCESSIBILITY_SCORE_TARGET,
    );
    rules.optional_array("accessibility_report.issues", Severity::Medium);
}

fn check_performance(rules: &mut Rules<'_>) {
    if rules
        .optional_object("performance_analysis", Severity::Medium)
        .is_none()
    {
        return;
    }
    const LOAD: &str = "performance_analysis.load_time_ms";
    if let Some(load) = rules.optional_number(LOAD, Severity::Medium)
        && load > LOAD_TIME_TARGET_MS
    {
        rules.error(
            LOAD,
            format!("Load time {load} ms exceeds the target of {LOAD_TIME_TARGET_MS} ms"),
            Severity::Medium,
            ErrorType::Compliance,
        );
    }
    target_min(
        rules,
        "performance_analysis.optimization_score",
        "Optimization score",
        OPTIMIZATION_SCORE_TARGET,
    );
    rules.optional_count("performance_analysis.file_size_bytes", Severity::Medium);
}

fn check_spam(rules: &mut Rules<'_>) {
    if rules
        .require_object("spam_analysis", Severity::Critical)
        .is_none()
    {
        return;
    }
    const SPAM: &str = "spam_analysis.spam_score";
    if let Some(score) = rules.require_number(SPAM, Severity::Critical)
        && rules.check_scale(SPAM, score, SPAM_SCORE_SCALE_MAX, Severity::Critical)
        && score > SPAM_SCORE_MAX
    {
        rules.error(
            SPAM,
            format!("Spam score {score} exceeds the maximum of {SPAM_SCORE_MAX}"),
            Severity::Critical,
            ErrorType::Compliance,
        );
    }
    if let Some(level) = rules.optional_str("spam_analysis.risk_level", Severity::Medium) {
        rules.check_one_of("spam_analysis.risk_level", level, RISK_LEVELS, Severity::Medium);
    }
    rules.optional_strings("spam_analysis.triggers", Severity::Medium);
}
