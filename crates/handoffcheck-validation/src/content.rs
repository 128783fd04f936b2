use handoffcheck_contracts::limits::{
    BODY_MIN_CHARS, CTA_MAX_CHARS, PREHEADER_MAX_CHARS, SUBJECT_MAX_CHARS,
};
use handoffcheck_contracts::{
    ContentHandoff, ContractKind, ErrorType, HandoffType, Severity, ValidationResult,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::SpecialistValidator;
use crate::rules::Rules;

pub(crate) const TEMPLATE_TYPES: &[&str] =
    &["promotional", "informational", "newsletter", "transactional"];

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is valid")
});

/// Validates content-to-design handoffs (authored email copy)
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentValidator;

impl SpecialistValidator for ContentValidator {
    fn contract(&self) -> ContractKind {
        ContractKind::Handoff(HandoffType::ContentToDesign)
    }

    fn validate(&self, output: &Value) -> ValidationResult {
        let Some(root) = output.as_object() else {
            return ValidationResult::not_an_object(output);
        };
        let mut rules = Rules::new(root);
        rules.check_identity();

        if rules
            .require_object("content_package", Severity::Critical)
            .is_some()
        {
            check_copy(&mut rules);
            check_metadata(&mut rules);
        }

        check_design_requirements(&mut rules);
        check_brand_guidelines(&mut rules);

        rules.finish::<ContentHandoff>(output)
    }
}

fn check_design_requirements(rules: &mut Rules<'_>) {
    const BASE: &str = "design_requirements";
    if rules.optional_object(BASE, Severity::Medium).is_none() {
        return;
    }
    let template_path = format!("{BASE}.template_type");
    if let Some(template_type) = rules.optional_str(&template_path, Severity::Medium) {
        rules.check_one_of(&template_path, template_type, TEMPLATE_TYPES, Severity::Medium);
    }
    for field in ["visual_style", "layout", "color_scheme"] {
        rules.optional_str(&format!("{BASE}.{field}"), Severity::Medium);
    }
}

fn check_brand_guidelines(rules: &mut Rules<'_>) {
    const BASE: &str = "brand_guidelines";
    if rules.optional_object(BASE, Severity::Medium).is_none() {
        return;
    }
    rules.optional_str(&format!("{BASE}.brand_voice"), Severity::Medium);
    rules.optional_str(&format!("{BASE}.typography"), Severity::Medium);

    let palette_path = format!("{BASE}.color_palette");
    if let Some(palette) = rules.optional_array(&palette_path, Severity::Medium) {
        for (i, color) in palette.iter().enumerate() {
            let valid = color.as_str().is_some_and(|c| HEX_COLOR.is_match(c));
            if !valid {
                rules.error(
                    &format!("{palette_path}.{i}"),
                    format!("Color {color} is not a hex color (#rgb or #rrggbb)"),
                    Severity::Medium,
                    ErrorType::FormatInvalid,
                );
            }
        }
    }
}

fn check_copy(rules: &mut Rules<'_>) {
    const BASE: &str = "content_package.complete_content";
    if rules
        .require_object(BASE, Severity::Critical)
        .is_none()
    {
        return;
    }

    let subject = format!("{BASE}.subject");
    if let Some(value) = rules.require_str(&subject, Severity::Critical) {
        rules.check_chars(&subject, value, None, Some(SUBJECT_MAX_CHARS), Severity::Critical);
    }

    let preheader = format!("{BASE}.preheader");
    match rules.optional_str(&preheader, Severity::Medium) {
        Some(value) if value.trim().is_empty() => rules.error(
            &preheader,
            "Preheader is empty; inbox previews will fall back to body text",
            Severity::Medium,
            ErrorType::MissingField,
        ),
        Some(value) => {
            rules.check_chars(&preheader, value, None, Some(PREHEADER_MAX_CHARS), Severity::Medium);
        }
        None => rules.error(
            &preheader,
            "Preheader is missing",
            Severity::Medium,
            ErrorType::MissingField,
        ),
    }

    let body = format!("{BASE}.body");
    if let Some(value) = rules.require_str(&body, Severity::Critical) {
        rules.check_chars(&body, value, Some(BODY_MIN_CHARS), None, Severity::Critical);
    }

    let cta = format!("{BASE}.cta");
    if let Some(value) = rules.require_str(&cta, Severity::Critical) {
        rules.check_chars(&cta, value, None, Some(CTA_MAX_CHARS), Severity::Critical);
    }
}

fn check_metadata(rules: &mut Rules<'_>) {
    const BASE: &str = "content_package.content_metadata";
    if rules.optional_object(BASE, Severity::Medium).is_none() {
        return;
    }
    rules.optional_str(&format!("{BASE}.language"), Severity::Medium);
    if let Some(tone) = rules.optional_str(&format!("{BASE}.tone"), Severity::Medium)
        && tone.trim().is_empty()
    {
        rules.error(
            &format!("{BASE}.tone"),
            "Tone is empty",
            Severity::Medium,
            ErrorType::MissingField,
        );
    }
    rules.optional_count(&format!("{BASE}.word_count"), Severity::Medium);
}
