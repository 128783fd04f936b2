//! Anthropic Messages API backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use handoffcheck_config::Config;
use handoffcheck_utils::error::LlmError;

use crate::http_client::{HttpClient, HttpParams, api_key_from_env};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Clone)]
pub(crate) struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl AnthropicBackend {
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

    /// Build from `[llm]` / `[llm.anthropic]`.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.anthropic.as_ref();
        let api_key = api_key_from_env("anthropic", section, DEFAULT_API_KEY_ENV)?;
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

    /// Split system messages into the top-level `system` field.
    ///
    /// Multiple system messages are joined with a blank line.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut conversation = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => match system_prompt.as_mut() {
                    Some(existing) => {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    }
                    None => system_prompt = Some(msg.content.clone()),
                },
                Role::User | Role::Assistant => conversation.push(AnthropicMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        (system_prompt, conversation)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = "anthropic",
            trace_id = %inv.trace_id,
            model = %model,
            max_tokens = params.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let (system, messages) = Self::convert_messages(&inv.messages);
        let request_body = AnthropicRequest {
            model: model.clone(),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content = text_content(&response_body.content);
        if content.is_empty() {
            return Err(LlmError::Transport(
                "Anthropic response missing text content".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "anthropic", model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        debug!(
            provider = "anthropic",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Anthropic invocation completed"
        );

        Ok(result)
    }
}

/// Concatenate every `text` block
fn text_content(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter(|b| b.content_type == "text")
        .filter_map(|b| b.text.as_deref())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_convert_messages_separates_system() {
        let messages = vec![
            Message::system("one"),
            Message::user("payload"),
            Message::system("two"),
        ];
        let (system, conversation) = AnthropicBackend::convert_messages(&messages);
        assert_eq!(system.as_deref(), Some("one\n\ntwo"));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].role, "user");
    }

    #[test]
    fn test_convert_messages_no_system() {
        let (system, conversation) =
            AnthropicBackend::convert_messages(&[Message::user("only user")]);
        assert!(system.is_none());
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_request_omits_empty_system() {
        let request = AnthropicRequest {
            model: "m".to_string(),
            messages: vec![],
            max_tokens: 10,
            temperature: 0.0,
            system: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_text_content_skips_other_blocks() {
        let body = r#"{"content":[{"type":"text","text":"{\"a\""},{"type":"tool_use"},{"type":"text","text":":1}"}],
                       "usage":{"input_tokens":5,"output_tokens":2}}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(text_content(&parsed.content), "{\"a\":1}");
    }

    #[test]
    fn test_resolve_params_defaults() {
        let backend = AnthropicBackend::new(
            "k".to_string(),
            None,
            "claude".to_string(),
            HttpParams::default(),
        )
        .unwrap();
        let inv = LlmInvocation::new("t", "correction", "", Duration::from_secs(5), vec![]);
        let (model, params) = backend.resolve_params(&inv);
        assert_eq!(model, "claude");
        assert_eq!(params, HttpParams::default());
    }
}
