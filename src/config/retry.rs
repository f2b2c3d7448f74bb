use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;

/// Governs how `run_with_retry` retries a failed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of retry attempts after the initial try.
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Whether each subsequent retry doubles the previous delay.
    pub exponential_backoff: bool,

    /// Error kinds worth retrying. `None` means "use the built-in default
    /// set" (timeouts and network-class transport errors, never
    /// protocol/validation errors).
    pub retryable_errors: Option<HashSet<ErrorKind>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            exponential_backoff: true,
            retryable_errors: None,
        }
    }
}

impl Config {
    /// The error kinds to retry against, resolving `None` to the built-in
    /// default set.
    pub fn effective_retryable_errors(&self) -> HashSet<ErrorKind> {
        self.retryable_errors.clone().unwrap_or_else(|| {
            [
                ErrorKind::Timeout,
                ErrorKind::TransportError,
                ErrorKind::TransportSendError,
            ]
            .into_iter()
            .collect()
        })
    }

    /// Delay before the given retry attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff || attempt <= 1 {
            return self.base_delay;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay.is_zero() && self.max_retries > 0 {
            return Err("base_delay must be non-zero when retries are enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_delay_on_each_attempt_when_exponential() {
        let config = Config::default();
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn flat_delay_when_exponential_backoff_disabled() {
        let mut config = Config::default();
        config.exponential_backoff = false;
        assert_eq!(config.delay_for_attempt(1), config.base_delay);
        assert_eq!(config.delay_for_attempt(5), config.base_delay);
    }

    #[test]
    fn default_retryable_errors_exclude_protocol_errors() {
        let config = Config::default();
        let retryable = config.effective_retryable_errors();
        assert!(retryable.contains(&ErrorKind::Timeout));
        assert!(retryable.contains(&ErrorKind::TransportError));
        assert!(retryable.contains(&ErrorKind::TransportSendError));
        assert!(!retryable.contains(&ErrorKind::ModbusException));
    }
}
