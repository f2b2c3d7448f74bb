use std::future::Future;

use tracing::debug;

use crate::config::RetryConfig;
use crate::errors::ModbusError;

/// Re-runs `operation` according to `policy`: attempt 0 runs immediately;
/// each subsequent attempt (up to `max_retries`) sleeps for the configured
/// backoff first, unless the failing error's kind is outside the
/// retryable set, in which case it is returned immediately.
pub async fn run_with_retry<F, Fut, T>(policy: &RetryConfig, mut operation: F) -> Result<T, ModbusError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModbusError>>,
{
    let retryable = policy.effective_retryable_errors();
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries || !retryable.contains(&err.kind()) {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                debug!(attempt, ?delay, kind = %err.kind(), "retrying after failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Protocol;
    use crate::errors::{ErrorContext, Phase};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn timeout_error() -> ModbusError {
        ModbusError::Timeout {
            elapsed: Duration::from_millis(1),
            context: ErrorContext::new(1, Protocol::Rtu, Phase::Receive),
        }
    }

    fn invalid_argument_error() -> ModbusError {
        ModbusError::InvalidArgument {
            details: "bad address".to_string(),
            context: ErrorContext::new(1, Protocol::Rtu, Phase::Validate),
        }
    }

    #[tokio::test]
    async fn retries_up_to_max_retries_on_retryable_errors() {
        let policy = RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            exponential_backoff: false,
            retryable_errors: None,
        };
        let attempts = AtomicU32::new(0);

        let result: Result<(), ModbusError> = run_with_retry(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(timeout_error()) }
        })
        .await;

        assert!(matches!(result, Err(ModbusError::Timeout { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_immediately_for_non_retryable_errors() {
        let policy = RetryConfig::default();
        let attempts = AtomicU32::new(0);

        let result: Result<(), ModbusError> = run_with_retry(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(invalid_argument_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_retrying_once_an_attempt_succeeds() {
        let policy = RetryConfig::default();
        let attempts = AtomicU32::new(0);

        let result = run_with_retry(&policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(timeout_error())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
