use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `HandoffCheckError` is returned by the operations that can genuinely fail:
/// configuration discovery, backend construction, monitor lifecycle and file
/// input. Contract violations are never errors; they are reported as
/// `ValidationError` entries inside a `ValidationResult`.
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors, undetermined handoff type |
/// | 10 | Backend timeout |
/// | 70 | Other LLM backend failures |
/// | 1 | Other errors |
#[derive(Error, Debug)]
pub enum HandoffCheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HandoffCheckError {
    /// Map this error to the documented CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::InvalidInput(_) => ExitCode::CLI_ARGS,
            Self::Llm(LlmError::Timeout { .. }) => ExitCode::TIMEOUT,
            Self::Llm(_) => ExitCode::LLM_FAILURE,
            Self::Monitor(_) | Self::Io(_) | Self::Json(_) => ExitCode::INTERNAL,
        }
    }

    /// Render the error with context and suggestions for terminal output.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let (message, context, suggestions) = match self {
            Self::Config(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Llm(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Monitor(e) => (e.user_message(), e.context(), e.suggestions()),
            Self::Io(e) => (format!("File system error: {e}"), None, Vec::new()),
            Self::Json(e) => (
                format!("Payload is not valid JSON: {e}"),
                Some("Handoff payloads must be a single JSON object.".to_string()),
                vec!["Check the file with a JSON linter".to_string()],
            ),
            Self::InvalidInput(msg) => (msg.clone(), None, Vec::new()),
        };

        let mut out = format!("✗ {message}");
        if let Some(context) = context {
            out.push_str(&format!("\n\n  {context}"));
        }
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for s in suggestions {
                out.push_str(&format!("\n  - {s}"));
            }
        }
        out
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Backend,
    Monitoring,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Backend => write!(f, "Generative Backend"),
            Self::Monitoring => write!(f, "Monitoring"),
            Self::Validation => write!(f, "Validation"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [validation], [monitor] and [llm] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range requirements."
            )),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "handoffcheck searches for .handoffcheck/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Compare with the example configuration in the README".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "max_retry_attempts" => vec!["Use a value between 1 and 3".to_string()],
                "success_rate_floor" => {
                    vec!["Use a fraction between 0.0 and 1.0 (e.g. 0.95)".to_string()]
                }
                "llm_provider" => {
                    vec!["Supported providers: openrouter, anthropic".to_string()]
                }
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .handoffcheck/config.toml in your project root".to_string(),
                "Use CLI flags instead of a configuration file".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the directory tree".to_string(),
                "Use --config <path> to specify configuration file explicitly".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {:?}", duration)
            }
            Self::BudgetExceeded { limit, attempted } => format!(
                "LLM budget exceeded: attempted {} calls, limit is {}",
                attempted, limit
            ),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("Transport errors occur when the LLM backend cannot be reached.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a correction takes longer than the validation deadline."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("Budget limits cap the number of correction calls per process.".to_string())
            }
            Self::Misconfiguration(_) | Self::Unsupported(_) => Some(
                "Backend settings live in the [llm] section of .handoffcheck/config.toml."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Verify network connectivity".to_string(),
                "Retry the validation later".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Export the API key variable named by api_key_env".to_string(),
            ],
            Self::ProviderQuota(_) => vec!["Wait before retrying".to_string()],
            Self::Timeout { .. } => vec![
                "Increase --max-validation-time-ms".to_string(),
                "Validate without --correct".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Raise [llm] budget or HANDOFFCHECK_LLM_BUDGET".to_string(),
            ],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Set [llm] provider to 'openrouter' or 'anthropic'".to_string(),
                "Set the model for the selected provider".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Backend
    }
}

/// Errors raised by the validation monitor lifecycle
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Monitoring loop is already running")]
    AlreadyRunning,

    #[error("Monitoring loop is not running")]
    NotRunning,

    #[error("Monitoring interval must be greater than zero: {name}")]
    InvalidInterval { name: String },
}

impl UserFriendlyError for MonitorError {
    fn user_message(&self) -> String {
        match self {
            Self::AlreadyRunning => "The monitoring loop has already been started".to_string(),
            Self::NotRunning => "The monitoring loop has stopped".to_string(),
            Self::InvalidInterval { name } => format!("Monitoring interval '{name}' is zero"),
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AlreadyRunning => vec!["Call stop_monitoring() before restarting".to_string()],
            Self::NotRunning => vec!["Call start_monitoring() to obtain a new receiver".to_string()],
            Self::InvalidInterval { .. } => vec!["Use an interval of at least 1 second".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Monitoring
    }
}
