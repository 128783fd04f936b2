//! Core types for LLM backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use handoffcheck_utils::error::LlmError;

/// Timeout applied when a caller does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to an LLM backend invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Trace id of the handoff this call serves, for log correlation
    pub trace_id: String,
    /// What the call is for (e.g. "correction")
    pub purpose: String,
    /// Model to use; empty means the backend default
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
    /// Provider-specific metadata (e.g., temperature, max_tokens)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        trace_id: impl Into<String>,
        purpose: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            purpose: purpose.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the invocation
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Concatenated text of every user message
    #[must_use]
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Result from an LLM backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    pub raw_response: String,
    /// Provider name ("openrouter", "anthropic", ...)
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub extensions: HashMap<String, serde_json::Value>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            extensions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Trait for generative-text backends
///
/// The corrector only depends on this trait, so tests substitute scripted
/// backends and production wires an HTTP provider behind a budget.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the model with the given invocation parameters
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth, quota,
    /// outages), timeouts and budget exhaustion.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;

    /// Send one user prompt and return the raw response text
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let inv = LlmInvocation::new(
            "",
            "complete",
            "",
            DEFAULT_TIMEOUT,
            vec![Message::user(prompt)],
        );
        Ok(self.invoke(inv).await?.raw_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmBackend for Echo {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new(inv.user_text(), "echo", "echo-1"))
        }
    }

    #[tokio::test]
    async fn test_complete_sends_single_user_message() {
        let text = Echo.complete("hello").await.unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_user_text_skips_system_messages() {
        let inv = LlmInvocation::new(
            "t",
            "p",
            "",
            DEFAULT_TIMEOUT,
            vec![Message::system("rules"), Message::user("a"), Message::user("b")],
        );
        assert_eq!(inv.user_text(), "a\n\nb");
    }

    #[test]
    fn test_result_builders() {
        let result = LlmResult::new("{}", "mock", "m")
            .with_tokens(10, 2)
            .with_extension("budget_remaining", serde_json::json!(3));
        assert_eq!(result.tokens_input, Some(10));
        assert_eq!(result.extensions["budget_remaining"], 3);
    }
}
