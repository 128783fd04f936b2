use handoffcheck_utils::error::ConfigError;

use super::model::{Config, ConfigSource, ProviderConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding handoffcheck in a pipeline service that should
    /// not depend on config files or the working directory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use handoffcheck_config::Config;
    ///
    /// let config = Config::builder()
    ///     .max_retry_attempts(2)
    ///     .max_validation_time_ms(10_000)
    ///     .llm_provider("anthropic")
    ///     .build()
    ///     .expect("valid config");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    max_retry_attempts: Option<u32>,
    max_validation_time_ms: Option<u64>,
    allow_correction: Option<bool>,
    agent_id: Option<String>,
    timeout_threshold_ms: Option<u64>,
    success_rate_floor: Option<f64>,
    min_samples_for_alert: Option<usize>,
    max_recent_validations: Option<usize>,
    max_alerts: Option<usize>,
    llm_provider: Option<String>,
    llm_model: Option<String>,
    llm_budget: Option<u32>,
    openrouter: Option<ProviderConfig>,
    anthropic: Option<ProviderConfig>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Correction attempts per handoff (1 to 3).
    #[must_use]
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = Some(attempts);
        self
    }

    /// Wall-clock budget for one validation (at least 100 ms).
    #[must_use]
    pub fn max_validation_time_ms(mut self, ms: u64) -> Self {
        self.max_validation_time_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn allow_correction(mut self, allow: bool) -> Self {
        self.allow_correction = Some(allow);
        self
    }

    #[must_use]
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    #[must_use]
    pub fn timeout_threshold_ms(mut self, ms: u64) -> Self {
        self.timeout_threshold_ms = Some(ms);
        self
    }

    /// Rolling success rate below which the monitor raises a system_error event.
    #[must_use]
    pub fn success_rate_floor(mut self, floor: f64) -> Self {
        self.success_rate_floor = Some(floor);
        self
    }

    #[must_use]
    pub fn min_samples_for_alert(mut self, samples: usize) -> Self {
        self.min_samples_for_alert = Some(samples);
        self
    }

    #[must_use]
    pub fn max_recent_validations(mut self, capacity: usize) -> Self {
        self.max_recent_validations = Some(capacity);
        self
    }

    #[must_use]
    pub fn max_alerts(mut self, capacity: usize) -> Self {
        self.max_alerts = Some(capacity);
        self
    }

    #[must_use]
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm_provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn llm_budget(mut self, budget: u32) -> Self {
        self.llm_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn openrouter(mut self, provider: ProviderConfig) -> Self {
        self.openrouter = Some(provider);
        self
    }

    #[must_use]
    pub fn anthropic(mut self, provider: ProviderConfig) -> Self {
        self.anthropic = Some(provider);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::defaults();
        let attr = &mut config.source_attribution;
        let mut mark = |key: &str| {
            attr.insert(key.to_string(), ConfigSource::Programmatic);
        };

        if let Some(v) = self.max_retry_attempts {
            config.validation.max_retry_attempts = v;
            mark("max_retry_attempts");
        }
        if let Some(v) = self.max_validation_time_ms {
            config.validation.max_validation_time_ms = v;
            mark("max_validation_time_ms");
        }
        if let Some(v) = self.allow_correction {
            config.validation.allow_correction = v;
            mark("allow_correction");
        }
        if let Some(v) = self.agent_id {
            config.validation.agent_id = v;
            mark("agent_id");
        }
        if let Some(v) = self.timeout_threshold_ms {
            config.monitor.timeout_threshold_ms = v;
            mark("timeout_threshold_ms");
        }
        if let Some(v) = self.success_rate_floor {
            config.monitor.success_rate_floor = v;
            mark("success_rate_floor");
        }
        if let Some(v) = self.min_samples_for_alert {
            config.monitor.min_samples_for_alert = v;
            mark("min_samples_for_alert");
        }
        if let Some(v) = self.max_recent_validations {
            config.monitor.max_recent_validations = v;
            mark("max_recent_validations");
        }
        if let Some(v) = self.max_alerts {
            config.monitor.max_alerts = v;
            mark("max_alerts");
        }
        if let Some(v) = self.llm_provider {
            config.llm.provider = Some(v);
            mark("llm_provider");
        }
        if let Some(v) = self.llm_model {
            config.llm.model = Some(v);
            mark("llm_model");
        }
        if let Some(v) = self.llm_budget {
            config.llm.budget = Some(v);
            mark("llm_budget");
        }
        config.llm.openrouter = self.openrouter;
        config.llm.anthropic = self.anthropic;

        config.validate()?;
        Ok(config)
    }
}
