use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The stage boundary a payload is crossing.
///
/// Determines which contract and which specialist validator apply.
///
/// # Example
///
/// ```rust
/// use handoffcheck_contracts::HandoffType;
///
/// let ty: HandoffType = "design-to-quality".parse().unwrap();
/// assert_eq!(ty, HandoffType::DesignToQuality);
/// assert_eq!(ty.to_string(), "design-to-quality");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandoffType {
    /// Content authoring output consumed by the design stage
    ContentToDesign,
    /// Rendered email consumed by the quality stage
    DesignToQuality,
    /// Quality report consumed by the delivery stage
    QualityToDelivery,
}

impl HandoffType {
    pub const ALL: [HandoffType; 3] = [
        HandoffType::ContentToDesign,
        HandoffType::DesignToQuality,
        HandoffType::QualityToDelivery,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ContentToDesign => "content-to-design",
            Self::DesignToQuality => "design-to-quality",
            Self::QualityToDelivery => "quality-to-delivery",
        }
    }

    /// Read the optional `handoff_type` tag carried by a payload.
    ///
    /// Returns `None` when the value is not an object, has no tag, or the tag
    /// is not a known handoff type.
    #[must_use]
    pub fn detect(value: &Value) -> Option<Self> {
        value
            .as_object()?
            .get("handoff_type")?
            .as_str()?
            .parse()
            .ok()
    }

    /// Short lowercase prefix used when minting trace ids for this stage
    #[must_use]
    pub const fn trace_prefix(&self) -> &'static str {
        match self {
            Self::ContentToDesign => "content",
            Self::DesignToQuality => "design",
            Self::QualityToDelivery => "quality",
        }
    }
}

impl fmt::Display for HandoffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handoff type '{0}' (expected one of: content-to-design, design-to-quality, quality-to-delivery)")]
pub struct ParseHandoffTypeError(pub String);

impl FromStr for HandoffType {
    type Err = ParseHandoffTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "content-to-design" => Ok(Self::ContentToDesign),
            "design-to-quality" => Ok(Self::DesignToQuality),
            "quality-to-delivery" => Ok(Self::QualityToDelivery),
            _ => Err(ParseHandoffTypeError(s.to_string())),
        }
    }
}

/// Every contract a specialist validator can enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Handoff(HandoffType),
    DeliveryPackage,
}

impl ContractKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Handoff(ty) => ty.as_str(),
            Self::DeliveryPackage => "delivery-package",
        }
    }
}

impl From<HandoffType> for ContractKind {
    fn from(ty: HandoffType) -> Self {
        Self::Handoff(ty)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractKind {
    type Err = ParseHandoffTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        if normalized == "delivery-package" {
            return Ok(Self::DeliveryPackage);
        }
        normalized
            .parse::<HandoffType>()
            .map(Self::Handoff)
            .map_err(|_| ParseHandoffTypeError(s.to_string()))
    }
}
