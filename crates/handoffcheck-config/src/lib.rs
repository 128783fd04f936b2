//! Configuration for handoffcheck: TOML discovery, programmatic builder,
//! range validation and per-key source attribution.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use model::{
    CliArgs, Config, ConfigSource, DEFAULT_AGENT_ID, DEFAULT_PROVIDER, LlmConfig, MonitorConfig,
    ProviderConfig, ValidationConfig,
};
pub use sources::KEYS;

/// Environment variable naming the directory that holds `config.toml`
pub const HOME_ENV: &str = "HANDOFFCHECK_HOME";

/// Directory searched for upward from the working directory
pub const CONFIG_DIR_NAME: &str = ".handoffcheck";

/// Config file name inside [`CONFIG_DIR_NAME`] or [`HOME_ENV`]
pub const CONFIG_FILE_NAME: &str = "config.toml";
