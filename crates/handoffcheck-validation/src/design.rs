use handoffcheck_contracts::limits::HTML_MAX_BYTES;
use handoffcheck_contracts::{
    ContractKind, DesignHandoff, ErrorType, HandoffType, Severity, ValidationResult,
};
use serde_json::Value;

use crate::SpecialistValidator;
use crate::content::TEMPLATE_TYPES;
use crate::markup::{check_mjml, html_structure_problems};
use crate::rules::Rules;

/// Validates design-to-quality handoffs (rendered email)
#[derive(Debug, Clone, Copy, Default)]
pub struct DesignValidator;

impl SpecialistValidator for DesignValidator {
    fn contract(&self) -> ContractKind {
        ContractKind::Handoff(HandoffType::DesignToQuality)
    }

    fn validate(&self, output: &Value) -> ValidationResult {
        let Some(root) = output.as_object() else {
            return ValidationResult::not_an_object(output);
        };
        let mut rules = Rules::new(root);
        rules.check_identity();

        if rules
            .require_object("email_package", Severity::Critical)
            .is_some()
        {
            check_html(&mut rules);

            const MJML: &str = "email_package.mjml_source";
            if let Some(mjml) = rules.optional_str(MJML, Severity::Critical)
                && !mjml.trim().is_empty()
                && let Err(problem) = check_mjml(mjml)
            {
                rules.error(MJML, problem, Severity::Critical, ErrorType::FormatInvalid);
            }

            rules.optional_str("email_package.inline_css", Severity::Medium);

            const ASSETS: &str = "email_package.asset_urls";
            if let Some(urls) = rules.optional_array(ASSETS, Severity::Medium) {
                for (i, url) in urls.iter().enumerate() {
                    let ok = url
                        .as_str()
                        .is_some_and(|u| u.starts_with("https://") || u.starts_with("http://"));
                    if !ok {
                        rules.error(
                            &format!("{ASSETS}.{i}"),
                            format!("Asset URL {url} is not an http(s) URL"),
                            Severity::Medium,
                            ErrorType::FormatInvalid,
                        );
                    }
                }
            }
        }

        if rules
            .optional_object("rendering_metadata", Severity::Medium)
            .is_some()
        {
            if let Some(template_type) =
                rules.optional_str("rendering_metadata.template_type", Severity::Medium)
            {
                rules.check_one_of(
                    "rendering_metadata.template_type",
                    template_type,
                    TEMPLATE_TYPES,
                    Severity::Medium,
                );
            }
            rules.optional_count("rendering_metadata.file_size_bytes", Severity::Medium);
            rules.optional_number("rendering_metadata.render_time_ms", Severity::Medium);
        }

        rules.optional_object("design_specifications", Severity::Medium);

        rules.check_original_content(true);

        rules.finish::<DesignHandoff>(output)
    }
}

fn check_html(rules: &mut Rules<'_>) {
    const HTML: &str = "email_package.html_content";
    let Some(html) = rules.require_str(HTML, Severity::Critical) else {
        return;
    };

    let size = html.len();
    if size > HTML_MAX_BYTES {
        rules.error(
            HTML,
            format!(
                "HTML is {:.1} KB ({size} bytes), maximum is {} KB",
                size as f64 / 1024.0,
                HTML_MAX_BYTES / 1024
            ),
            Severity::Critical,
            ErrorType::SizeLimit,
        );
    }

    for problem in html_structure_problems(html) {
        rules.error(HTML, problem, Severity::Critical, ErrorType::FormatInvalid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    #[test]
    fn test_oversized_html_is_rejected() {
        let mut value = fixtures::design();
        let mut html = fixtures::html();
        html.insert_str(html.len() - "</body></html>".len(), &"x".repeat(HTML_MAX_BYTES));
        value["email_package"]["html_content"] = Value::from(html);

        let result = DesignValidator.validate(&value);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].error_type, ErrorType::SizeLimit);
        assert_eq!(result.errors[0].field, "email_package.html_content");
    }

    #[test]
    fn test_html_exactly_at_limit_is_accepted() {
        let mut value = fixtures::design();
        let mut html = fixtures::html();
        let pad = HTML_MAX_BYTES - html.len();
        html.insert_str(html.len() - "</body></html>".len(), &"x".repeat(pad));
        assert_eq!(html.len(), HTML_MAX_BYTES);
        value["email_package"]["html_content"] = Value::from(html);

        assert!(DesignValidator.validate(&value).is_valid);
    }

    #[test]
    fn test_structure_problems_are_critical() {
        let mut value = fixtures::design();
        value["email_package"]["html_content"] = json!("<div>fragment</div>");
        let result = DesignValidator.validate(&value);
        assert_eq!(result.critical_count(), 4);
        assert!(
            result
                .errors
                .iter()
                .all(|e| e.error_type == ErrorType::FormatInvalid)
        );
    }

    #[test]
    fn test_malformed_mjml_is_critical() {
        let mut value = fixtures::design();
        value["email_package"]["mjml_source"] = json!("<mjml><mj-body><mj-section></mj-body></mjml>");
        let result = DesignValidator.validate(&value);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "email_package.mjml_source");
    }

    #[test]
    fn test_mjml_is_optional() {
        let mut value = fixtures::design();
        value["email_package"]
            .as_object_mut()
            .unwrap()
            .remove("mjml_source");
        assert!(DesignValidator.validate(&value).is_valid);
    }

    #[test]
    fn test_wrong_typed_cosmetic_fields_stay_advisory() {
        let mut value = fixtures::design();
        value["rendering_metadata"]["file_size_bytes"] = json!(92.5);
        value["original_content"]["subject"] = json!(5);
        value["email_package"]["asset_urls"] = json!("https://cdn.example.com/a.png");

        let result = DesignValidator.validate(&value);
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.critical_count(), 0);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "email_package.asset_urls",
                "rendering_metadata.file_size_bytes",
                "original_content.subject",
            ]
        );
    }

    #[test]
    fn test_cosmetic_findings_are_advisory() {
        let mut value = fixtures::design();
        value["email_package"]["asset_urls"] = json!(["ftp://old.example.com/a.png"]);
        value["rendering_metadata"]["template_type"] = json!("seasonal");
        value["original_content"]["cta"] = json!("");
        let result = DesignValidator.validate(&value);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 3);
    }
}
