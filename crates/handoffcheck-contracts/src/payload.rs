//! Typed handoff payloads
//!
//! Deserialization is lenient about cosmetic fields: a wrong-typed value falls
//! back to its default (see [`crate::lenient`]). Enumerated cosmetic values such
//! as `template_type` are checked by the validators, not by serde, so an
//! unknown value stays a warning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handoff_type::HandoffType;

/// Email copy as authored by the content stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteContent {
    pub subject: String,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub preheader: String,
    pub body: String,
    pub cta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub tone: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub word_count: Option<u64>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub reading_time: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackage {
    pub complete_content: CompleteContent,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub content_metadata: Option<ContentMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignRequirements {
    /// One of `promotional`, `informational`, `newsletter`, `transactional`
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub template_type: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub visual_style: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub layout: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub color_scheme: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandGuidelines {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub brand_voice: Option<String>,
    /// Hex colors, `#rgb` or `#rrggbb`
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub color_palette: Vec<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub typography: Option<String>,
}

/// content-to-design payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentHandoff {
    pub trace_id: String,
    pub timestamp: String,
    pub content_package: ContentPackage,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub design_requirements: Option<DesignRequirements>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub brand_guidelines: Option<BrandGuidelines>,
}

/// Copy carried forward from the content stage for reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginalContent {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub preheader: String,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub body: String,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPackage {
    pub html_content: String,
    #[serde(default)]
    pub mjml_source: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub inline_css: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub asset_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderingMetadata {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub template_type: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub render_time_ms: Option<f64>,
}

/// design-to-quality payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignHandoff {
    pub trace_id: String,
    pub timestamp: String,
    pub email_package: EmailPackage,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub rendering_metadata: Option<RenderingMetadata>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub design_specifications: Option<Value>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub original_content: Option<OriginalContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPackage {
    pub quality_score: f64,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub quality_issues: Vec<Value>,
    /// One of `approved`, `needs_revision`, `rejected`
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub approval_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub html_validation: Option<bool>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub css_validation: Option<bool>,
    pub client_compatibility_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    pub wcag_aa_compliant: bool,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub accessibility_score: Option<f64>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub issues: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub load_time_ms: Option<f64>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub optimization_score: Option<f64>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub file_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamAnalysis {
    pub spam_score: f64,
    /// One of `low`, `medium`, `high`
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub triggers: Vec<String>,
}

/// quality-to-delivery payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityHandoff {
    pub trace_id: String,
    pub timestamp: String,
    pub quality_package: QualityPackage,
    pub test_results: TestResults,
    pub accessibility_report: AccessibilityReport,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub performance_analysis: Option<PerformanceAnalysis>,
    pub spam_analysis: SpamAnalysis,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub original_content: Option<OriginalContent>,
}

/// A handoff payload tagged by the boundary it crosses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandoffPayload {
    ContentToDesign(ContentHandoff),
    DesignToQuality(DesignHandoff),
    QualityToDelivery(QualityHandoff),
}

impl HandoffPayload {
    /// Build the typed variant for `handoff_type` from an untyped value
    pub fn from_value(value: Value, handoff_type: HandoffType) -> Result<Self, serde_json::Error> {
        Ok(match handoff_type {
            HandoffType::ContentToDesign => Self::ContentToDesign(serde_json::from_value(value)?),
            HandoffType::DesignToQuality => Self::DesignToQuality(serde_json::from_value(value)?),
            HandoffType::QualityToDelivery => {
                Self::QualityToDelivery(serde_json::from_value(value)?)
            }
        })
    }

    #[must_use]
    pub const fn handoff_type(&self) -> HandoffType {
        match self {
            Self::ContentToDesign(_) => HandoffType::ContentToDesign,
            Self::DesignToQuality(_) => HandoffType::DesignToQuality,
            Self::QualityToDelivery(_) => HandoffType::QualityToDelivery,
        }
    }

    #[must_use]
    pub fn trace_id(&self) -> &str {
        match self {
            Self::ContentToDesign(p) => &p.trace_id,
            Self::DesignToQuality(p) => &p.trace_id,
            Self::QualityToDelivery(p) => &p.trace_id,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        match self {
            Self::ContentToDesign(p) => &p.timestamp,
            Self::DesignToQuality(p) => &p.timestamp,
            Self::QualityToDelivery(p) => &p.timestamp,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
