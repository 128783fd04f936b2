use handoffcheck_contracts::limits::{
    DEPLOYMENT_GUIDE_MIN_CHARS, PACKAGE_MAX_BYTES, README_MIN_CHARS, TECHNICAL_SPECS_MIN_CHARS,
};
use handoffcheck_contracts::{
    ContractKind, DeliveryPackage, ErrorType, PreviewVariant, Severity, ValidationResult,
};
use serde_json::Value;

use crate::SpecialistValidator;
use crate::rules::Rules;

/// Validates the delivery stage's output package
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryPackageValidator;

impl SpecialistValidator for DeliveryPackageValidator {
    fn contract(&self) -> ContractKind {
        ContractKind::DeliveryPackage
    }

    fn validate(&self, output: &Value) -> ValidationResult {
        let Some(root) = output.as_object() else {
            return ValidationResult::not_an_object(output);
        };
        let mut rules = Rules::new(root);
        rules.check_identity();
        rules.require_str("campaign_id", Severity::Critical);

        let listed = check_files(&mut rules);

        const TOTAL: &str = "total_size_bytes";
        if let Some(total) = rules.require_number(TOTAL, Severity::Critical) {
            if total > PACKAGE_MAX_BYTES as f64 {
                rules.error(
                    TOTAL,
                    format!(
                        "Package is {:.1} KB ({total} bytes), maximum is {} KB",
                        total / 1024.0,
                        PACKAGE_MAX_BYTES / 1024
                    ),
                    Severity::Critical,
                    ErrorType::SizeLimit,
                );
            }
            if let Some(listed) = listed
                && listed != total
            {
                rules.error(
                    TOTAL,
                    format!("Declared total {total} bytes differs from the listed files' {listed} bytes"),
                    Severity::Medium,
                    ErrorType::Range,
                );
            }
        }

        check_documentation(&mut rules);
        rules.optional_object("delivery_report", Severity::Medium);

        rules.finish::<DeliveryPackage>(output)
    }
}

/// Check one `{name, size_bytes}` entry, returning its size
fn check_file(rules: &mut Rules<'_>, path: &str) -> Option<f64> {
    rules.require_object(path, Severity::Critical)?;
    let name = rules.require_str(&format!("{path}.name"), Severity::Critical);
    let size = rules.require_number(&format!("{path}.size_bytes"), Severity::Critical);
    name.and(size)
}

/// Returns the sum of listed file sizes when every size was readable
fn check_files(rules: &mut Rules<'_>) -> Option<f64> {
    const FILES: &str = "package_files";
    rules.require_object(FILES, Severity::Critical)?;

    let mut total = Some(0.0);
    let mut add = |size: Option<f64>| {
        total = match (total, size) {
            (Some(t), Some(s)) => Some(t + s),
            _ => None,
        };
    };

    add(check_file(rules, "package_files.html_file"));

    if rules.optional_object("package_files.mjml_file", Severity::Critical).is_some() {
        add(check_file(rules, "package_files.mjml_file"));
    }

    if let Some(assets) = rules.optional_array("package_files.asset_files", Severity::Critical) {
        for i in 0..assets.len() {
            add(check_file(rules, &format!("package_files.asset_files.{i}")));
        }
    }

    const PREVIEWS: &str = "package_files.preview_files";
    let mut variants = Vec::new();
    match rules.require_array(PREVIEWS, Severity::Critical) {
        Some(previews) => {
            for i in 0..previews.len() {
                let path = format!("{PREVIEWS}.{i}");
                add(check_file(rules, &path));
                let variant_path = format!("{path}.variant");
                if let Some(variant) = rules.require_str(&variant_path, Severity::Critical) {
                    match variant.parse::<PreviewVariant>() {
                        Ok(v) => variants.push(v),
                        Err(message) => rules.error(
                            &variant_path,
                            message,
                            Severity::Critical,
                            ErrorType::TypeMismatch,
                        ),
                    }
                }
            }
            for required in [PreviewVariant::Desktop, PreviewVariant::Mobile] {
                if !variants.contains(&required) {
                    rules.error(
                        PREVIEWS,
                        format!("Preview files must include a {required} variant"),
                        Severity::Critical,
                        ErrorType::MissingField,
                    );
                }
            }
        }
        None => add(None),
    }

    total
}

fn check_documentation(rules: &mut Rules<'_>) {
    if rules
        .require_object("documentation", Severity::Critical)
        .is_none()
    {
        return;
    }
    for (section, min) in [
        ("readme", README_MIN_CHARS),
        ("technical_specs", TECHNICAL_SPECS_MIN_CHARS),
        ("deployment_guide", DEPLOYMENT_GUIDE_MIN_CHARS),
    ] {
        let path = format!("documentation.{section}");
        if let Some(text) = rules.require_str(&path, Severity::Critical) {
            rules.check_chars(&path, text.trim(), Some(min), None, Severity::Critical);
        }
    }
}
