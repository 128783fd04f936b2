//! Shared HTTP client with retry policy and provider error mapping

use reqwest::{RequestBuilder, Response, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use handoffcheck_config::ProviderConfig;
use handoffcheck_utils::error::LlmError;

/// Retries after the first attempt for retryable failures
const MAX_RETRIES: u32 = 2;

/// First backoff delay; doubled on each retry
const BASE_BACKOFF: Duration = Duration::from_millis(250);

/// Longest provider error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Sampling parameters shared by the HTTP backends
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.1,
        }
    }
}

impl HttpParams {
    /// Provider config values over built-in defaults
    pub fn from_provider(provider: Option<&ProviderConfig>) -> Self {
        let defaults = Self::default();
        Self {
            max_tokens: provider
                .and_then(|p| p.max_tokens)
                .unwrap_or(defaults.max_tokens),
            temperature: provider
                .and_then(|p| p.temperature)
                .unwrap_or(defaults.temperature),
        }
    }

    /// Invocation metadata (`max_tokens`, `temperature`) over these values
    pub fn resolve(&self, metadata: &HashMap<String, serde_json::Value>) -> Self {
        Self {
            max_tokens: metadata
                .get("max_tokens")
                .and_then(|v| v.as_u64())
                .map(|v| v as u32)
                .unwrap_or(self.max_tokens),
            temperature: metadata
                .get("temperature")
                .and_then(|v| v.as_f64())
                .map(|v| v as f32)
                .unwrap_or(self.temperature),
        }
    }
}

/// Read the API key named by `[llm.<provider>] api_key_env`
pub(crate) fn api_key_from_env(
    provider: &str,
    config: Option<&ProviderConfig>,
    default_env: &str,
) -> Result<String, LlmError> {
    let env_name = config
        .and_then(|p| p.api_key_env.as_deref())
        .unwrap_or(default_env);
    match std::env::var(env_name) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::Misconfiguration(format!(
            "{provider} API key not found in environment variable '{env_name}'. \
             Set this variable or configure a different api_key_env in [llm.{provider}]."
        ))),
    }
}

pub(crate) struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the TLS backend cannot be initialized
    pub fn new() -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("handoffcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send `request`, retrying transport errors, 429 and 5xx with backoff.
    ///
    /// The timeout applies to each attempt; the caller's own deadline bounds the total.
    pub async fn execute_with_retry(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<Response, LlmError> {
        let mut attempt = 0;
        loop {
            let Some(this_try) = request.try_clone() else {
                return Err(LlmError::Transport(format!(
                    "{provider} request body cannot be retried"
                )));
            };

            let outcome = match this_try.timeout(timeout).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    map_status(provider, status, &body)
                }
                Err(e) if e.is_timeout() => return Err(LlmError::Timeout { duration: timeout }),
                Err(e) => LlmError::Transport(format!("{provider} request failed: {e}")),
            };

            if attempt >= MAX_RETRIES || !is_retryable(&outcome) {
                return Err(outcome);
            }

            let delay = BASE_BACKOFF * 2u32.pow(attempt);
            attempt += 1;
            warn!(
                provider,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %outcome,
                "Retrying provider request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::Transport(_) | LlmError::ProviderQuota(_) | LlmError::ProviderOutage(_)
    )
}

/// Map a non-success HTTP status to the error taxonomy
pub(crate) fn map_status(provider: &str, status: StatusCode, body: &str) -> LlmError {
    let body = truncate_body(body);
    debug!(provider, status = status.as_u16(), "Provider returned error status");
    let message = format!("{provider} returned {status}: {body}");
    match status.as_u16() {
        401 | 403 => LlmError::ProviderAuth(message),
        429 => LlmError::ProviderQuota(message),
        408 | 500..=599 => LlmError::ProviderOutage(message),
        _ => LlmError::Transport(message),
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status("openrouter", StatusCode::UNAUTHORIZED, ""),
            LlmError::ProviderAuth(_)
        ));
        assert!(matches!(
            map_status("openrouter", StatusCode::TOO_MANY_REQUESTS, ""),
            LlmError::ProviderQuota(_)
        ));
        assert!(matches!(
            map_status("anthropic", StatusCode::BAD_GATEWAY, ""),
            LlmError::ProviderOutage(_)
        ));
        assert!(matches!(
            map_status("anthropic", StatusCode::BAD_REQUEST, "bad"),
            LlmError::Transport(_)
        ));
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(&LlmError::ProviderOutage(String::new())));
        assert!(is_retryable(&LlmError::ProviderQuota(String::new())));
        assert!(!is_retryable(&LlmError::ProviderAuth(String::new())));
        assert!(!is_retryable(&LlmError::Timeout {
            duration: Duration::from_secs(1)
        }));
    }

    #[test]
    fn test_params_precedence() {
        let provider = ProviderConfig {
            max_tokens: Some(1024),
            ..ProviderConfig::default()
        };
        let params = HttpParams::from_provider(Some(&provider));
        assert_eq!(params.max_tokens, 1024);
        assert_eq!(params.temperature, HttpParams::default().temperature);

        let mut metadata = HashMap::new();
        metadata.insert("temperature".to_string(), serde_json::json!(0.5));
        let resolved = params.resolve(&metadata);
        assert_eq!(resolved.max_tokens, 1024);
        assert_eq!(resolved.temperature, 0.5);
    }

    #[test]
    fn test_missing_api_key_names_variable() {
        let provider = ProviderConfig {
            api_key_env: Some("HANDOFFCHECK_TEST_UNSET_KEY".to_string()),
            ..ProviderConfig::default()
        };
        unsafe {
            std::env::remove_var("HANDOFFCHECK_TEST_UNSET_KEY");
        }
        match api_key_from_env("openrouter", Some(&provider), "OPENROUTER_API_KEY") {
            Err(LlmError::Misconfiguration(msg)) => {
                assert!(msg.contains("HANDOFFCHECK_TEST_UNSET_KEY"));
            }
            other => panic!("expected Misconfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let err = map_status("openrouter", StatusCode::BAD_REQUEST, &"x".repeat(1000));
        let message = err.to_string();
        assert!(message.ends_with("..."));
        assert!(message.len() < 400);
    }
}
