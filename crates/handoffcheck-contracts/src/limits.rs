//! Shared contract limits
//!
//! Hard limits block a handoff. Soft targets only produce advisory findings.

/// Maximum rendered HTML size in bytes (100 KiB)
pub const HTML_MAX_BYTES: usize = 100 * 1024;

/// Maximum total delivery package size in bytes (600 KiB)
pub const PACKAGE_MAX_BYTES: u64 = 600 * 1024;

pub const QUALITY_SCORE_MIN: f64 = 70.0;
pub const SPAM_SCORE_MAX: f64 = 3.0;
pub const CLIENT_COMPATIBILITY_MIN: f64 = 95.0;

// Soft targets
pub const ACCESSIBILITY_SCORE_TARGET: f64 = 90.0;
pub const LOAD_TIME_TARGET_MS: f64 = 3000.0;
pub const OPTIMIZATION_SCORE_TARGET: f64 = 80.0;

pub const SUBJECT_MAX_CHARS: usize = 100;
pub const PREHEADER_MAX_CHARS: usize = 150;
pub const CTA_MAX_CHARS: usize = 50;
pub const BODY_MIN_CHARS: usize = 20;

pub const README_MIN_CHARS: usize = 100;
pub const TECHNICAL_SPECS_MIN_CHARS: usize = 50;
pub const DEPLOYMENT_GUIDE_MIN_CHARS: usize = 50;

/// Upper bound of the spam score scale
pub const SPAM_SCORE_SCALE_MAX: f64 = 10.0;

/// Correction attempts allowed per handoff
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default wall-clock budget for one `validate` call
pub const MAX_VALIDATION_TIME_MS: u64 = 30_000;
