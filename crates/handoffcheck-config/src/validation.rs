use handoffcheck_contracts::limits::MAX_RETRY_ATTEMPTS;
use handoffcheck_utils::error::ConfigError;

use super::model::Config;

const KNOWN_PROVIDERS: &[&str] = &["openrouter", "anthropic"];

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if v.max_retry_attempts == 0 || v.max_retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(invalid(
                "max_retry_attempts",
                format!("{} (must be between 1 and {MAX_RETRY_ATTEMPTS})", v.max_retry_attempts),
            ));
        }
        if v.max_validation_time_ms < 100 {
            return Err(invalid(
                "max_validation_time_ms",
                format!("{} (must be at least 100 ms)", v.max_validation_time_ms),
            ));
        }
        if v.agent_id.trim().is_empty() {
            return Err(invalid("agent_id", "must not be empty"));
        }

        let m = &self.monitor;
        if !(0.0..=1.0).contains(&m.success_rate_floor) {
            return Err(invalid(
                "success_rate_floor",
                format!("{} (must be between 0.0 and 1.0)", m.success_rate_floor),
            ));
        }
        if m.timeout_threshold_ms == 0 {
            return Err(invalid("timeout_threshold_ms", "must be greater than 0"));
        }
        if m.max_recent_validations == 0 {
            return Err(invalid("max_recent_validations", "must be greater than 0"));
        }
        if m.max_alerts == 0 {
            return Err(invalid("max_alerts", "must be greater than 0"));
        }
        if m.metrics_interval_secs == 0 {
            return Err(invalid("metrics_interval_secs", "must be at least 1 second"));
        }
        if m.health_check_interval_secs == 0 {
            return Err(invalid("health_check_interval_secs", "must be at least 1 second"));
        }

        if let Some(provider) = &self.llm.provider
            && !KNOWN_PROVIDERS.contains(&provider.as_str())
        {
            return Err(invalid(
                "llm_provider",
                format!("'{provider}' (expected one of: {})", KNOWN_PROVIDERS.join(", ")),
            ));
        }
        if self.llm.budget == Some(0) {
            return Err(invalid("llm_budget", "must be greater than 0"));
        }
        if self.llm.timeout_secs == Some(0) {
            return Err(invalid("llm_timeout_secs", "must be at least 1 second"));
        }
        for (name, provider) in [
            ("openrouter", &self.llm.openrouter),
            ("anthropic", &self.llm.anthropic),
        ] {
            if let Some(p) = provider
                && let Some(t) = p.temperature
                && !(0.0..=2.0).contains(&t)
            {
                return Err(invalid(
                    &format!("llm.{name}.temperature"),
                    format!("{t} (must be between 0.0 and 2.0)"),
                ));
            }
        }

        Ok(())
    }
}
