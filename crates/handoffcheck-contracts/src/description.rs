//! Human-readable contract descriptions
//!
//! Used verbatim in correction prompts and by `handoffcheck contract`.

use crate::handoff_type::{ContractKind, HandoffType};
use crate::limits::*;

const IDENTITY_CONSTRAINTS: [&str; 2] = [
    "trace_id: string matching <prefix>-<epoch>-<suffix> (lowercase prefix, 10-13 digit epoch, >= 4 lowercase alphanumeric suffix)",
    "timestamp: ISO-8601 / RFC 3339 date-time string",
];

/// Field constraints of a contract, one line per rule
#[must_use]
pub fn contract_constraints(kind: ContractKind) -> Vec<String> {
    let mut lines: Vec<String> = IDENTITY_CONSTRAINTS.iter().map(|s| (*s).to_string()).collect();
    match kind {
        ContractKind::Handoff(HandoffType::ContentToDesign) => {
            lines.extend([
                format!("content_package.complete_content.subject: 1-{SUBJECT_MAX_CHARS} characters"),
                format!(
                    "content_package.complete_content.preheader: at most {PREHEADER_MAX_CHARS} characters"
                ),
                format!("content_package.complete_content.body: at least {BODY_MIN_CHARS} characters"),
                format!("content_package.complete_content.cta: 1-{CTA_MAX_CHARS} characters"),
                "content_package.content_metadata: object with language, tone, word_count".to_string(),
                "design_requirements.template_type: one of promotional, informational, newsletter, transactional".to_string(),
                "brand_guidelines.color_palette: array of hex colors (#rgb or #rrggbb)".to_string(),
            ]);
        }
        ContractKind::Handoff(HandoffType::DesignToQuality) => {
            lines.extend([
                format!(
                    "email_package.html_content: MUST be <= {} KB ({HTML_MAX_BYTES} bytes)",
                    HTML_MAX_BYTES / 1024
                ),
                "email_package.html_content: MUST start with <!DOCTYPE html> and contain <html>, <head> and <body>".to_string(),
                "email_package.mjml_source (optional): balanced tags from the MJML tag set, rooted at <mjml>".to_string(),
                "email_package.asset_urls: array of http(s) URLs".to_string(),
                "rendering_metadata: object with template_type, file_size_bytes, render_time_ms".to_string(),
                "original_content: subject, preheader, body and cta from the content stage".to_string(),
            ]);
        }
        ContractKind::Handoff(HandoffType::QualityToDelivery) => {
            lines.extend([
                format!("quality_package.quality_score: number 0-100, MUST be >= {QUALITY_SCORE_MIN}"),
                "quality_package.approval_status: one of approved, needs_revision, rejected".to_string(),
                format!(
                    "test_results.client_compatibility_score: number 0-100, MUST be >= {CLIENT_COMPATIBILITY_MIN}"
                ),
                "accessibility_report.wcag_aa_compliant: MUST be true".to_string(),
                format!(
                    "accessibility_report.accessibility_score: number 0-100, target >= {ACCESSIBILITY_SCORE_TARGET}"
                ),
                format!("performance_analysis.load_time_ms: number, target <= {LOAD_TIME_TARGET_MS}"),
                format!(
                    "performance_analysis.optimization_score: number 0-100, target >= {OPTIMIZATION_SCORE_TARGET}"
                ),
                format!(
                    "spam_analysis.spam_score: number 0-{SPAM_SCORE_SCALE_MAX}, MUST be <= {SPAM_SCORE_MAX}"
                ),
                "spam_analysis.risk_level: one of low, medium, high".to_string(),
                "original_content: subject, preheader, body and cta from the content stage".to_string(),
            ]);
        }
        ContractKind::DeliveryPackage => {
            lines.extend([
                "campaign_id: non-empty string".to_string(),
                "package_files.html_file: {name, size_bytes}".to_string(),
                "package_files.preview_files: MUST include desktop and mobile variants".to_string(),
                format!(
                    "total_size_bytes: MUST be <= {} KB ({PACKAGE_MAX_BYTES} bytes)",
                    PACKAGE_MAX_BYTES / 1024
                ),
                format!("documentation.readme: at least {README_MIN_CHARS} characters"),
                format!(
                    "documentation.technical_specs: at least {TECHNICAL_SPECS_MIN_CHARS} characters"
                ),
                format!(
                    "documentation.deployment_guide: at least {DEPLOYMENT_GUIDE_MIN_CHARS} characters"
                ),
            ]);
        }
    }
    lines
}

/// Full contract description: a title line followed by bulleted constraints
#[must_use]
pub fn contract_description(kind: ContractKind) -> String {
    let title = match kind {
        ContractKind::Handoff(HandoffType::ContentToDesign) => {
            "Content-to-design handoff: authored email copy for the design stage"
        }
        ContractKind::Handoff(HandoffType::DesignToQuality) => {
            "Design-to-quality handoff: rendered email for the quality stage"
        }
        ContractKind::Handoff(HandoffType::QualityToDelivery) => {
            "Quality-to-delivery handoff: quality report for the delivery stage"
        }
        ContractKind::DeliveryPackage => "Delivery package: final campaign files and documentation",
    };
    let mut out = format!("{title}\n");
    for line in contract_constraints(kind) {
        out.push_str("- ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_description_mentions_subject_limit() {
        let text = contract_description(HandoffType::ContentToDesign.into());
        assert!(text.contains("subject: 1-100 characters"));
        assert!(text.contains("trace_id"));
    }

    #[test]
    fn test_quality_description_has_hard_minimums() {
        let text = contract_description(HandoffType::QualityToDelivery.into());
        assert!(text.contains("MUST be >= 70"));
        assert!(text.contains("MUST be <= 3"));
        assert!(text.contains("MUST be >= 95"));
    }

    #[test]
    fn test_every_contract_has_identity_rules() {
        for kind in HandoffType::ALL
            .into_iter()
            .map(ContractKind::from)
            .chain([ContractKind::DeliveryPackage])
        {
            let lines = contract_constraints(kind);
            assert!(lines.len() > IDENTITY_CONSTRAINTS.len(), "{kind} has no body rules");
            assert!(lines[0].starts_with("trace_id"));
        }
    }
}
