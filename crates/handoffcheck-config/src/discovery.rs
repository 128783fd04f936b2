use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use handoffcheck_utils::error::ConfigError;

use super::model::{CliArgs, Config, ConfigSource, LlmConfig};
use super::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, HOME_ENV};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    validation: Option<TomlValidation>,
    monitor: Option<TomlMonitor>,
    llm: Option<LlmConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlValidation {
    max_retry_attempts: Option<u32>,
    max_validation_time_ms: Option<u64>,
    allow_correction: Option<bool>,
    agent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlMonitor {
    timeout_threshold_ms: Option<u64>,
    success_rate_floor: Option<f64>,
    min_samples_for_alert: Option<usize>,
    max_recent_validations: Option<usize>,
    max_alerts: Option<usize>,
    metrics_interval_secs: Option<u64>,
    health_check_interval_secs: Option<u64>,
}

/// Assign `$value` to `$target` when present and record where it came from
macro_rules! apply {
    ($attr:expr, $source:expr, $key:literal, $target:expr, $value:expr) => {
        if let Some(value) = $value {
            $target = value;
            $attr.insert($key.to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for the upward search and falls back
    /// to the user config directory when nothing is found there.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        let user_config = dirs::config_dir()
            .map(|dir| dir.join("handoffcheck").join(CONFIG_FILE_NAME))
            .filter(|path| path.is_file());
        Self::discover_with_fallback(&start_dir, cli_args, user_config)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests; it never consults the
    /// user config directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_fallback(start_dir, cli_args, None)
    }

    fn discover_with_fallback(
        start_dir: &Path,
        cli_args: &CliArgs,
        fallback: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = Self::defaults();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::home_config_file()
                .or(Self::discover_config_file_from(start_dir)?)
                .or(fallback),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config file");
            config.apply_file(file_config, ConfigSource::ConfigFile(path.clone()));
        }

        config.apply_cli(cli_args);
        config.validate()?;

        Ok(config)
    }

    fn apply_file(&mut self, file: TomlConfig, source: ConfigSource) {
        let attr = &mut self.source_attribution;

        if let Some(v) = file.validation {
            let target = &mut self.validation;
            apply!(attr, source, "max_retry_attempts", target.max_retry_attempts, v.max_retry_attempts);
            apply!(attr, source, "max_validation_time_ms", target.max_validation_time_ms, v.max_validation_time_ms);
            apply!(attr, source, "allow_correction", target.allow_correction, v.allow_correction);
            apply!(attr, source, "agent_id", target.agent_id, v.agent_id);
        }

        if let Some(m) = file.monitor {
            let target = &mut self.monitor;
            apply!(attr, source, "timeout_threshold_ms", target.timeout_threshold_ms, m.timeout_threshold_ms);
            apply!(attr, source, "success_rate_floor", target.success_rate_floor, m.success_rate_floor);
            apply!(attr, source, "min_samples_for_alert", target.min_samples_for_alert, m.min_samples_for_alert);
            apply!(attr, source, "max_recent_validations", target.max_recent_validations, m.max_recent_validations);
            apply!(attr, source, "max_alerts", target.max_alerts, m.max_alerts);
            apply!(attr, source, "metrics_interval_secs", target.metrics_interval_secs, m.metrics_interval_secs);
            apply!(attr, source, "health_check_interval_secs", target.health_check_interval_secs, m.health_check_interval_secs);
        }

        if let Some(llm) = file.llm {
            let target = &mut self.llm;
            apply!(attr, source, "llm_provider", target.provider, llm.provider.map(Some));
            apply!(attr, source, "llm_model", target.model, llm.model.map(Some));
            apply!(attr, source, "llm_budget", target.budget, llm.budget.map(Some));
            apply!(attr, source, "llm_timeout_secs", target.timeout_secs, llm.timeout_secs.map(Some));
            if llm.openrouter.is_some() {
                target.openrouter = llm.openrouter;
            }
            if llm.anthropic.is_some() {
                target.anthropic = llm.anthropic;
            }
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let attr = &mut self.source_attribution;
        let source = ConfigSource::Cli;
        apply!(attr, source, "max_validation_time_ms", self.validation.max_validation_time_ms, cli.max_validation_time_ms);
        apply!(attr, source, "allow_correction", self.validation.allow_correction, cli.allow_correction);
        apply!(attr, source, "agent_id", self.validation.agent_id, cli.agent_id.clone());
        apply!(attr, source, "llm_provider", self.llm.provider, cli.llm_provider.clone().map(Some));
        apply!(attr, source, "llm_model", self.llm.model, cli.model.clone().map(Some));
    }

    /// `$HANDOFFCHECK_HOME/config.toml`, when the variable is set and the file exists
    fn home_config_file() -> Option<PathBuf> {
        let home = env::var_os(HOME_ENV).filter(|h| !h.is_empty())?;
        let path = PathBuf::from(home).join(CONFIG_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.handoffcheck/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).map_err(|e| {
                    ConfigError::InvalidFile(format!("{}: {}", path.display(), e.message()))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
