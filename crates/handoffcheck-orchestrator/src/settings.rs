use std::time::Duration;

use handoffcheck_config::Config;
use handoffcheck_contracts::limits::{MAX_RETRY_ATTEMPTS, MAX_VALIDATION_TIME_MS};

/// Limits and identity used by a [`HandoffValidator`](crate::HandoffValidator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffSettings {
    /// Correction attempts per handoff, capped at `MAX_RETRY_ATTEMPTS`
    pub max_attempts: u32,
    /// Wall-clock budget for one `validate` call including corrections
    pub deadline: Duration,
    /// Reported to the monitor for every validation
    pub agent_id: String,
    /// Agent type reported to the monitor; defaults to the producing stage
    pub agent_type: Option<String>,
}

impl Default for HandoffSettings {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_ATTEMPTS,
            deadline: Duration::from_millis(MAX_VALIDATION_TIME_MS),
            agent_id: handoffcheck_config::DEFAULT_AGENT_ID.to_string(),
            agent_type: None,
        }
    }
}

impl From<&Config> for HandoffSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.validation.max_retry_attempts.min(MAX_RETRY_ATTEMPTS),
            deadline: config.validation.deadline(),
            agent_id: config.validation.agent_id.clone(),
            agent_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = Config::builder()
            .max_retry_attempts(2)
            .max_validation_time_ms(5000)
            .agent_id("pipeline-a")
            .build()
            .unwrap();
        let settings = HandoffSettings::from(&config);
        assert_eq!(settings.max_attempts, 2);
        assert_eq!(settings.deadline, Duration::from_millis(5000));
        assert_eq!(settings.agent_id, "pipeline-a");
    }

    #[test]
    fn test_defaults_match_contract_limits() {
        let settings = HandoffSettings::default();
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.deadline, Duration::from_millis(30_000));
    }
}
