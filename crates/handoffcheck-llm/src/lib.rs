//! Generative-text backend abstraction for handoffcheck
//!
//! The corrector talks to models through the [`LlmBackend`] trait. Production
//! backends are HTTP providers (OpenRouter, Anthropic) wrapped in a
//! [`BudgetedBackend`] that caps calls per process.

mod anthropic_backend;
mod budgeted_backend;
mod http_client;
mod openrouter_backend;
mod types;

pub use budgeted_backend::{BUDGET_ENV_VAR, BudgetedBackend, DEFAULT_BUDGET_LIMIT};
pub use handoffcheck_utils::error::LlmError;
pub use types::{DEFAULT_TIMEOUT, LlmBackend, LlmInvocation, LlmResult, Message, Role};

use handoffcheck_config::Config;

use anthropic_backend::AnthropicBackend;
use openrouter_backend::OpenRouterBackend;

/// Providers `from_config` can construct
pub const SUPPORTED_PROVIDERS: &[&str] = &["openrouter", "anthropic"];

/// Construct the configured backend, wrapped in a call budget.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for an unknown provider and
/// `LlmError::Misconfiguration` when its API key is not available.
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let provider = config.provider();
    let inner: Box<dyn LlmBackend> = match provider {
        "openrouter" => Box::new(OpenRouterBackend::new_from_config(config)?),
        "anthropic" => Box::new(AnthropicBackend::new_from_config(config)?),
        unknown => {
            return Err(LlmError::Unsupported(format!(
                "Unknown LLM provider '{unknown}'. Supported providers: {}.",
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
    };

    tracing::debug!(provider, "Constructed LLM backend");
    Ok(Box::new(BudgetedBackend::with_limit_from_config(
        inner,
        config.llm.budget,
    )))
}

/// Model name the configured provider will use
#[must_use]
pub fn effective_model(config: &Config) -> String {
    let provider = config.provider();
    config
        .llm
        .model
        .clone()
        .or_else(|| {
            config
                .llm
                .provider_config(provider)
                .and_then(|p| p.model.clone())
        })
        .unwrap_or_else(|| match provider {
            "anthropic" => anthropic_backend::DEFAULT_MODEL.to_string(),
            _ => openrouter_backend::DEFAULT_MODEL.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoffcheck_config::ProviderConfig;

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let mut config = Config::defaults();
        config.llm.provider = Some("local-llama".to_string());
        match from_config(&config) {
            Err(LlmError::Unsupported(msg)) => assert!(msg.contains("local-llama")),
            Err(other) => panic!("expected Unsupported, got {other:?}"),
            Ok(_) => panic!("expected Unsupported"),
        }
    }

    #[test]
    fn test_missing_key_is_misconfiguration() {
        let mut config = Config::defaults();
        config.llm.provider = Some("anthropic".to_string());
        config.llm.anthropic = Some(ProviderConfig {
            api_key_env: Some("HANDOFFCHECK_TEST_NO_SUCH_KEY".to_string()),
            ..ProviderConfig::default()
        });
        unsafe {
            std::env::remove_var("HANDOFFCHECK_TEST_NO_SUCH_KEY");
        }
        assert!(matches!(
            from_config(&config),
            Err(LlmError::Misconfiguration(_))
        ));
    }

    #[test]
    fn test_effective_model_precedence() {
        let mut config = Config::defaults();
        assert_eq!(effective_model(&config), openrouter_backend::DEFAULT_MODEL);

        config.llm.provider = Some("anthropic".to_string());
        assert_eq!(effective_model(&config), anthropic_backend::DEFAULT_MODEL);

        config.llm.anthropic = Some(ProviderConfig {
            model: Some("section-model".to_string()),
            ..ProviderConfig::default()
        });
        assert_eq!(effective_model(&config), "section-model");

        config.llm.model = Some("global-model".to_string());
        assert_eq!(effective_model(&config), "global-model");
    }
}
