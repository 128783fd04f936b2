use std::collections::HashMap;

use super::model::{Config, ConfigSource};

/// Every attributed configuration key, in display order
pub const KEYS: &[&str] = &[
    "max_retry_attempts",
    "max_validation_time_ms",
    "allow_correction",
    "agent_id",
    "timeout_threshold_ms",
    "success_rate_floor",
    "min_samples_for_alert",
    "max_recent_validations",
    "max_alerts",
    "metrics_interval_secs",
    "health_check_interval_secs",
    "llm_provider",
    "llm_model",
    "llm_budget",
    "llm_timeout_secs",
];

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Defaults).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Unset optional keys (model, budget, timeout) are omitted.
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let mut config = HashMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        let v = &self.validation;
        add_config("max_retry_attempts", Some(v.max_retry_attempts.to_string()));
        add_config("max_validation_time_ms", Some(v.max_validation_time_ms.to_string()));
        add_config("allow_correction", Some(v.allow_correction.to_string()));
        add_config("agent_id", Some(v.agent_id.clone()));

        let m = &self.monitor;
        add_config("timeout_threshold_ms", Some(m.timeout_threshold_ms.to_string()));
        add_config("success_rate_floor", Some(m.success_rate_floor.to_string()));
        add_config("min_samples_for_alert", Some(m.min_samples_for_alert.to_string()));
        add_config("max_recent_validations", Some(m.max_recent_validations.to_string()));
        add_config("max_alerts", Some(m.max_alerts.to_string()));
        add_config("metrics_interval_secs", Some(m.metrics_interval_secs.to_string()));
        add_config(
            "health_check_interval_secs",
            Some(m.health_check_interval_secs.to_string()),
        );

        add_config("llm_provider", Some(self.provider().to_string()));
        add_config("llm_model", self.llm.model.clone());
        add_config("llm_budget", self.llm.budget.map(|b| b.to_string()));
        add_config("llm_timeout_secs", self.llm.timeout_secs.map(|t| t.to_string()));

        config
    }

    /// Effective configuration sorted in [`KEYS`] order, for display
    #[must_use]
    pub fn effective_config_ordered(&self) -> Vec<(String, String, String)> {
        let mut effective = self.effective_config();
        KEYS.iter()
            .filter_map(|key| {
                effective
                    .remove(*key)
                    .map(|(value, source)| ((*key).to_string(), value, source))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_labelled_default() {
        let config = Config::defaults();
        let effective = config.effective_config();
        assert_eq!(
            effective.get("max_retry_attempts"),
            Some(&("3".to_string(), "default".to_string()))
        );
        assert_eq!(
            effective.get("llm_provider"),
            Some(&("openrouter".to_string(), "default".to_string()))
        );
        assert!(!effective.contains_key("llm_model"));
    }

    #[test]
    fn test_ordered_view_follows_key_order() {
        let config = Config::defaults();
        let ordered = config.effective_config_ordered();
        assert_eq!(ordered[0].0, "max_retry_attempts");
        assert_eq!(ordered.last().map(|(k, _, _)| k.as_str()), Some("llm_provider"));
    }
}
