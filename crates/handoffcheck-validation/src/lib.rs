//! Specialist validators for stage handoff contracts
//!
//! Each validator is a stateless rule engine: it takes an untyped JSON value,
//! runs every rule of its contract without short-circuiting, and returns a
//! `ValidationResult`. Validators never panic on hostile input; anything that
//! is not a JSON object yields one critical `type_mismatch` error.

mod content;
mod delivery;
mod design;
pub mod markup;
mod quality;
mod rules;

pub use content::ContentValidator;
pub use delivery::DeliveryPackageValidator;
pub use design::DesignValidator;
pub use quality::QualityValidator;

use handoffcheck_contracts::{ContractKind, HandoffType, ValidationResult};
use serde_json::Value;

/// A stateless rule engine for one contract
pub trait SpecialistValidator: Send + Sync {
    /// The contract this validator enforces
    fn contract(&self) -> ContractKind;

    /// Judge `output` against the contract
    fn validate(&self, output: &Value) -> ValidationResult;
}

/// The validator responsible for a handoff boundary
#[must_use]
pub fn validator_for(handoff_type: HandoffType) -> Box<dyn SpecialistValidator> {
    match handoff_type {
        HandoffType::ContentToDesign => Box::new(ContentValidator),
        HandoffType::DesignToQuality => Box::new(DesignValidator),
        HandoffType::QualityToDelivery => Box::new(QualityValidator),
    }
}

/// The validator for any contract, including the delivery package
#[must_use]
pub fn validator_for_contract(kind: ContractKind) -> Box<dyn SpecialistValidator> {
    match kind {
        ContractKind::Handoff(ty) => validator_for(ty),
        ContractKind::DeliveryPackage => Box::new(DeliveryPackageValidator),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Payloads that satisfy every rule of their contract

    use serde_json::{Value, json};

    pub fn content() -> Value {
        json!({
            "trace_id": "content-1700000000000-abcd",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "content_package": {
                "complete_content": {
                    "subject": "Spring sale: 20% off everything",
                    "preheader": "Three days only",
                    "body": "Our biggest spring sale is here. Save on every item in the store.",
                    "cta": "Shop now"
                },
                "content_metadata": {"language": "en", "tone": "friendly", "word_count": 13}
            },
            "design_requirements": {"template_type": "promotional", "visual_style": "bright"},
            "brand_guidelines": {"brand_voice": "warm", "color_palette": ["#ff6600", "#fff"]}
        })
    }

    pub fn html() -> String {
        "<!DOCTYPE html>\n<html><head><title>Sale</title></head><body><h1>Spring sale</h1></body></html>"
            .to_string()
    }

    pub fn design() -> Value {
        json!({
            "trace_id": "design-1700000000000-abcd",
            "timestamp": "2024-05-01T10:05:00Z",
            "email_package": {
                "html_content": html(),
                "mjml_source": "<mjml><mj-body><mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section></mj-body></mjml>",
                "asset_urls": ["https://cdn.example.com/hero.png"]
            },
            "rendering_metadata": {"template_type": "promotional", "file_size_bytes": 92, "render_time_ms": 40},
            "original_content": {"subject": "Spring sale", "preheader": "", "body": "Body", "cta": "Shop"}
        })
    }

    pub fn quality() -> Value {
        json!({
            "trace_id": "quality-1700000000000-abcd",
            "timestamp": "2024-05-01T10:10:00Z",
            "quality_package": {"quality_score": 88, "quality_issues": [], "approval_status": "approved"},
            "test_results": {"html_validation": true, "css_validation": true, "client_compatibility_score": 97},
            "accessibility_report": {"wcag_aa_compliant": true, "accessibility_score": 94, "issues": []},
            "performance_analysis": {"load_time_ms": 1200, "optimization_score": 90, "file_size_bytes": 40960},
            "spam_analysis": {"spam_score": 1, "risk_level": "low", "triggers": []},
            "original_content": {"subject": "Spring sale", "preheader": "", "body": "Body", "cta": "Shop"}
        })
    }

    pub fn delivery_package() -> Value {
        json!({
            "trace_id": "delivery-1700000000000-abcd",
            "timestamp": "2024-05-01T10:15:00Z",
            "campaign_id": "spring-sale-2024",
            "package_files": {
                "html_file": {"name": "email.html", "size_bytes": 40960},
                "mjml_file": {"name": "email.mjml", "size_bytes": 10240},
                "preview_files": [
                    {"variant": "desktop", "name": "desktop.png", "size_bytes": 102400, "format": "png"},
                    {"variant": "mobile", "name": "mobile.png", "size_bytes": 51200, "format": "png"}
                ],
                "asset_files": [{"name": "hero.png", "size_bytes": 20480}]
            },
            "total_size_bytes": 225280,
            "documentation": {
                "readme": "This package contains the rendered spring sale campaign email, its MJML source, desktop and mobile previews and all referenced assets.",
                "technical_specs": "HTML email, 600px layout, inline CSS, tested in 30 clients.",
                "deployment_guide": "Upload email.html to the ESP and attach hero.png to the asset library."
            },
            "delivery_report": {"status": "ready"}
        })
    }
}
