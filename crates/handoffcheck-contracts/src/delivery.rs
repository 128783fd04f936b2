//! Delivery package contract
//!
//! The delivery stage's output: the files handed to the campaign owner plus
//! their documentation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Rendering variant of a preview image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewVariant {
    Desktop,
    Mobile,
    DarkMode,
}

impl PreviewVariant {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::DarkMode => "dark_mode",
        }
    }
}

impl fmt::Display for PreviewVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreviewVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            "dark_mode" => Ok(Self::DarkMode),
            other => Err(format!(
                "unknown preview variant '{other}' (expected desktop, mobile or dark_mode)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageFile {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewFile {
    pub variant: PreviewVariant,
    pub name: String,
    pub size_bytes: u64,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageFiles {
    pub html_file: PackageFile,
    #[serde(default)]
    pub mjml_file: Option<PackageFile>,
    #[serde(default)]
    pub preview_files: Vec<PreviewFile>,
    #[serde(default)]
    pub asset_files: Vec<PackageFile>,
}

impl PackageFiles {
    /// Sum of every listed file's size
    #[must_use]
    pub fn listed_size_bytes(&self) -> u64 {
        self.html_file.size_bytes
            + self.mjml_file.as_ref().map_or(0, |f| f.size_bytes)
            + self.preview_files.iter().map(|f| f.size_bytes).sum::<u64>()
            + self.asset_files.iter().map(|f| f.size_bytes).sum::<u64>()
    }

    #[must_use]
    pub fn has_variant(&self, variant: PreviewVariant) -> bool {
        self.preview_files.iter().any(|f| f.variant == variant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    pub readme: String,
    pub technical_specs: String,
    pub deployment_guide: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPackage {
    pub trace_id: String,
    pub timestamp: String,
    pub campaign_id: String,
    pub package_files: PackageFiles,
    pub total_size_bytes: u64,
    pub documentation: Documentation,
    #[serde(default, deserialize_with = "crate::lenient::or_default")]
    pub delivery_report: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> PackageFile {
        PackageFile {
            name: name.to_string(),
            size_bytes: size,
        }
    }

    #[test]
    fn test_listed_size_sums_all_files() {
        let files = PackageFiles {
            html_file: file("email.html", 100),
            mjml_file: Some(file("email.mjml", 50)),
            preview_files: vec![PreviewFile {
                variant: PreviewVariant::Desktop,
                name: "desktop.png".to_string(),
                size_bytes: 25,
                format: Some("png".to_string()),
            }],
            asset_files: vec![file("logo.png", 10), file("hero.jpg", 15)],
        };
        assert_eq!(files.listed_size_bytes(), 200);
        assert!(files.has_variant(PreviewVariant::Desktop));
        assert!(!files.has_variant(PreviewVariant::Mobile));
    }

    #[test]
    fn test_preview_variant_parse() {
        assert_eq!("dark_mode".parse::<PreviewVariant>(), Ok(PreviewVariant::DarkMode));
        assert!("tablet".parse::<PreviewVariant>().is_err());
    }
}
