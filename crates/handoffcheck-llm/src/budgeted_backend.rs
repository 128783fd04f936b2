//! Budgeted backend wrapper for LLM call limiting

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use handoffcheck_utils::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Default limit on backend calls per process
pub const DEFAULT_BUDGET_LIMIT: u32 = 20;

/// Environment variable overriding the budget limit
pub const BUDGET_ENV_VAR: &str = "HANDOFFCHECK_LLM_BUDGET";

/// A wrapper around an `LlmBackend` that enforces a limit on invocations.
///
/// The budget counts attempted calls, not successful ones: a failed call still
/// consumes its slot, so correction loops cannot retry past the limit.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit, "Creating BudgetedBackend");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Resolve the limit with precedence: env var > config > default (20).
    pub fn with_limit_from_config(inner: Box<dyn LlmBackend>, config_budget: Option<u32>) -> Self {
        let env_limit = std::env::var(BUDGET_ENV_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());

        let limit = match (env_limit, config_budget) {
            (Some(limit), _) => {
                debug!(limit, "Using budget limit from {}", BUDGET_ENV_VAR);
                limit
            }
            (None, Some(limit)) => {
                debug!(limit, "Using budget limit from config file");
                limit
            }
            (None, None) => DEFAULT_BUDGET_LIMIT,
        };

        Self::new(inner, limit)
    }

    /// Calls attempted so far, including refused ones
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Count before calling so concurrent callers cannot overshoot
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(limit = self.limit, attempted, "Budget limit exceeded");
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            call_count = current + 1,
            limit = self.limit,
            trace_id = %inv.trace_id,
            "Budget check passed, invoking inner backend"
        );

        let result = self.inner.invoke(inv).await;
        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                error = %e,
                "Inner backend invocation failed (budget slot still consumed)"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::sync::{Arc, Mutex, OnceLock};
    use std::time::Duration;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    struct MockSuccessBackend;

    #[async_trait]
    impl LlmBackend for MockSuccessBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new("{}", "mock", "mock-model"))
        }
    }

    struct MockFailureBackend;

    #[async_trait]
    impl LlmBackend for MockFailureBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::ProviderOutage("down".to_string()))
        }
    }

    fn invocation() -> LlmInvocation {
        LlmInvocation::new(
            "content-1700000000-abcd",
            "correction",
            "",
            Duration::from_secs(1),
            vec![Message::user("fix")],
        )
    }

    #[tokio::test]
    async fn test_budget_allows_calls_up_to_limit() {
        let backend = BudgetedBackend::new(Box::new(MockSuccessBackend), 2);
        assert!(backend.invoke(invocation()).await.is_ok());
        assert!(backend.invoke(invocation()).await.is_ok());
        match backend.invoke(invocation()).await {
            Err(LlmError::BudgetExceeded { limit, attempted }) => {
                assert_eq!(limit, 2);
                assert_eq!(attempted, 3);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failures_consume_budget() {
        let backend = BudgetedBackend::new(Box::new(MockFailureBackend), 1);
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::ProviderOutage(_))
        ));
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::BudgetExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_calls_never_exceed_limit() {
        let backend = Arc::new(BudgetedBackend::new(Box::new(MockSuccessBackend), 5));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move { backend.invoke(invocation()).await }));
        }
        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 5);
        assert_eq!(backend.call_count(), 20);
    }

    #[test]
    fn test_limit_precedence() {
        let _guard = env_guard();

        unsafe {
            std::env::remove_var(BUDGET_ENV_VAR);
        }
        let backend = BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), None);
        assert_eq!(backend.limit(), DEFAULT_BUDGET_LIMIT);

        let backend =
            BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), Some(7));
        assert_eq!(backend.limit(), 7);

        unsafe {
            std::env::set_var(BUDGET_ENV_VAR, "3");
        }
        let backend =
            BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), Some(7));
        assert_eq!(backend.limit(), 3);

        unsafe {
            std::env::set_var(BUDGET_ENV_VAR, "not-a-number");
        }
        let backend =
            BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), Some(7));
        assert_eq!(backend.limit(), 7);

        unsafe {
            std::env::remove_var(BUDGET_ENV_VAR);
        }
    }
}
