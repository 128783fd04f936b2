use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use handoffcheck_contracts::limits::{MAX_RETRY_ATTEMPTS, MAX_VALIDATION_TIME_MS};

/// Default agent identity reported to the monitor
pub const DEFAULT_AGENT_ID: &str = "handoffcheck";

/// Default LLM provider
pub const DEFAULT_PROVIDER: &str = "openrouter";

/// Source of a configuration value.
///
/// Precedence: CLI arguments > config file > programmatic builder > built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(_) => write!(f, "config"),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}

/// Configuration for handoffcheck.
///
/// `Config` is hierarchical: CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// [`Config::discover()`] mirrors the CLI:
/// - `--config <path>` wins when given
/// - otherwise `$HANDOFFCHECK_HOME/config.toml`
/// - otherwise `.handoffcheck/config.toml` searched upward from the current directory
/// - otherwise the user config directory (`<config_dir>/handoffcheck/config.toml`)
///
/// # Configuration File Format
///
/// ```toml
/// [validation]
/// max_retry_attempts = 3
/// max_validation_time_ms = 30000
/// allow_correction = true
/// agent_id = "content-pipeline"
///
/// [monitor]
/// timeout_threshold_ms = 10000
/// success_rate_floor = 0.95
///
/// [llm]
/// provider = "openrouter"
/// model = "anthropic/claude-3.5-haiku"
/// budget = 20
///
/// [llm.openrouter]
/// api_key_env = "OPENROUTER_API_KEY"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub validation: ValidationConfig,
    pub monitor: MonitorConfig,
    pub llm: LlmConfig,
    /// Source attribution for each setting (for `handoffcheck config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[validation]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Correction attempts per handoff, 1 to 3
    pub max_retry_attempts: u32,
    /// Wall-clock budget for one validation, in milliseconds
    pub max_validation_time_ms: u64,
    /// Whether `validate` may call the corrector when the caller does not say
    pub allow_correction: bool,
    /// Agent id reported to the monitor
    pub agent_id: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            max_validation_time_ms: MAX_VALIDATION_TIME_MS,
            allow_correction: false,
            agent_id: DEFAULT_AGENT_ID.to_string(),
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.max_validation_time_ms)
    }
}

/// `[monitor]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// A validation slower than this raises a timeout event
    pub timeout_threshold_ms: u64,
    /// Rolling success rate below this raises a system_error event
    pub success_rate_floor: f64,
    /// Validations needed before the success-rate rule fires
    pub min_samples_for_alert: usize,
    pub max_recent_validations: usize,
    pub max_alerts: usize,
    pub metrics_interval_secs: u64,
    pub health_check_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timeout_threshold_ms: 10_000,
            success_rate_floor: 0.95,
            min_samples_for_alert: 10,
            max_recent_validations: 1000,
            max_alerts: 100,
            metrics_interval_secs: 30,
            health_check_interval_secs: 60,
        }
    }
}

/// `[llm]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `openrouter` or `anthropic`
    pub provider: Option<String>,
    /// Model override applied to the selected provider
    pub model: Option<String>,
    /// Calls allowed per process
    pub budget: Option<u32>,
    /// Per-call HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
    pub openrouter: Option<ProviderConfig>,
    pub anthropic: Option<ProviderConfig>,
}

impl LlmConfig {
    /// Settings block of the selected provider, if any
    #[must_use]
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        match provider {
            "openrouter" => self.openrouter.as_ref(),
            "anthropic" => self.anthropic.as_ref(),
            _ => None,
        }
    }
}

/// `[llm.openrouter]` / `[llm.anthropic]` sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// CLI-provided overrides, highest precedence
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub max_validation_time_ms: Option<u64>,
    pub llm_provider: Option<String>,
    pub model: Option<String>,
    pub agent_id: Option<String>,
    pub allow_correction: Option<bool>,
}

impl Config {
    /// Built-in defaults with every key attributed to `Defaults`
    #[must_use]
    pub fn defaults() -> Self {
        let mut source_attribution = HashMap::new();
        for key in crate::sources::KEYS {
            source_attribution.insert((*key).to_string(), ConfigSource::Defaults);
        }
        Self {
            validation: ValidationConfig::default(),
            monitor: MonitorConfig::default(),
            llm: LlmConfig::default(),
            source_attribution,
        }
    }

    /// Selected provider name, defaulting to openrouter
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract_limits() {
        let config = Config::defaults();
        assert_eq!(config.validation.max_retry_attempts, 3);
        assert_eq!(config.validation.max_validation_time_ms, 30_000);
        assert_eq!(config.validation.deadline(), Duration::from_secs(30));
        assert_eq!(config.monitor.success_rate_floor, 0.95);
        assert_eq!(config.monitor.max_recent_validations, 1000);
        assert_eq!(config.monitor.max_alerts, 100);
        assert_eq!(config.provider(), "openrouter");
        assert_eq!(
            config.source_attribution.get("max_retry_attempts"),
            Some(&ConfigSource::Defaults)
        );
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "cli");
        assert_eq!(
            ConfigSource::ConfigFile(PathBuf::from("/x/config.toml")).to_string(),
            "config"
        );
        assert_eq!(ConfigSource::Defaults.to_string(), "default");
    }

    #[test]
    fn test_provider_config_lookup() {
        let llm = LlmConfig {
            anthropic: Some(ProviderConfig {
                model: Some("claude".to_string()),
                ..ProviderConfig::default()
            }),
            ..LlmConfig::default()
        };
        assert!(llm.provider_config("anthropic").is_some());
        assert!(llm.provider_config("openrouter").is_none());
        assert!(llm.provider_config("gemini").is_none());
    }
}
