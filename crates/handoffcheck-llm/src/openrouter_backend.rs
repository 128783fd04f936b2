//! OpenRouter HTTP backend (OpenAI-compatible chat completions)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use handoffcheck_config::Config;
use handoffcheck_utils::error::LlmError;

use crate::http_client::{HttpClient, HttpParams, api_key_from_env};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub(crate) const DEFAULT_MODEL: &str = "anthropic/claude-3.5-haiku";

const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_REFERER: &str = "https://github.com/EffortlessMetrics/handoffcheck";

const DEFAULT_TITLE: &str = "handoffcheck";

#[derive(Clone)]
pub(crate) struct OpenRouterBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenRouterBackend {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Build from `[llm]` / `[llm.openrouter]`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the API key variable is unset.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.openrouter.as_ref();
        let api_key = api_key_from_env("openrouter", section, DEFAULT_API_KEY_ENV)?;
        let default_model = config
            .llm
            .model
            .clone()
            .or_else(|| section.and_then(|s| s.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self::new(
            api_key,
            section.and_then(|s| s.base_url.clone()),
            default_model,
            HttpParams::from_provider(section),
        )
    }

    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };
        (model, self.default_params.resolve(&inv.metadata))
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = "openrouter",
            trace_id = %inv.trace_id,
            model = %model,
            max_tokens = params.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenRouter backend"
        );

        let request_body = OpenRouterRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let request = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", DEFAULT_REFERER)
            .header("X-Title", DEFAULT_TITLE)
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "openrouter")
            .await?;

        let response_body: OpenRouterResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::Transport("OpenRouter response missing choices[0] content".to_string())
            })?;

        let mut result = LlmResult::new(content, "openrouter", model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = "openrouter",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "OpenRouter invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use handoffcheck_config::ProviderConfig;
    use std::time::Duration;

    fn backend() -> OpenRouterBackend {
        OpenRouterBackend::new(
            "test-key".to_string(),
            None,
            "default-model".to_string(),
            HttpParams {
                max_tokens: 1024,
                temperature: 0.5,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_params_uses_defaults() {
        let inv = LlmInvocation::new("t", "correction", "", Duration::from_secs(60), vec![]);
        let (model, params) = backend().resolve_params(&inv);
        assert_eq!(model, "default-model");
        assert_eq!(params.max_tokens, 1024);
        assert_eq!(params.temperature, 0.5);
    }

    #[test]
    fn test_resolve_params_overrides_model_and_tokens() {
        let inv = LlmInvocation::new("t", "correction", "custom", Duration::from_secs(60), vec![])
            .with_metadata("max_tokens", serde_json::json!(2048));
        let (model, params) = backend().resolve_params(&inv);
        assert_eq!(model, "custom");
        assert_eq!(params.max_tokens, 2048);
        assert_eq!(params.temperature, 0.5);
    }

    #[test]
    fn test_convert_messages() {
        let messages = vec![
            Message::new(Role::System, "rules"),
            Message::new(Role::User, "fix this"),
            Message::new(Role::Assistant, "{}"),
        ];
        let converted = OpenRouterBackend::convert_messages(&messages);
        let roles: Vec<&str> = converted.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(converted[1].content, "fix this");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}],
                       "usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let parsed: OpenRouterResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn test_new_from_config_prefers_global_model() {
        let env = "HANDOFFCHECK_TEST_OPENROUTER_KEY";
        unsafe {
            std::env::set_var(env, "k");
        }
        let mut config = Config::defaults();
        config.llm.model = Some("global".to_string());
        config.llm.openrouter = Some(ProviderConfig {
            api_key_env: Some(env.to_string()),
            model: Some("section".to_string()),
            ..ProviderConfig::default()
        });
        let backend = OpenRouterBackend::new_from_config(&config).unwrap();
        assert_eq!(backend.default_model, "global");
        unsafe {
            std::env::remove_var(env);
        }
    }
}
