use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::Config as RetryConfig;

/// Governs the priority scheduler's concurrency and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Requests allowed in flight at once. Fixed at 1 for RTU/ASCII, since
    /// the bus has no addressing scheme that lets two transactions overlap.
    pub max_concurrent_requests: usize,

    /// Deadline for a single transaction before it is abandoned as a timeout.
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,

    pub default_retry: RetryConfig,

    /// Requests the queue holds before `schedule()` rejects with `QueueFull`.
    pub queue_size_limit: usize,

    /// Minimum gap enforced between the end of one transaction and the start
    /// of the next, to give slow slaves turnaround time.
    #[serde(with = "humantime_serde")]
    pub request_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 1,
            default_timeout: Duration::from_millis(3000),
            default_retry: RetryConfig::default(),
            queue_size_limit: 100,
            request_interval: Duration::from_millis(10),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_requests != 1 {
            return Err("max_concurrent_requests must be 1 for a shared RTU/ASCII bus".to_string());
        }
        if self.default_timeout.is_zero() {
            return Err("default_timeout must be non-zero".to_string());
        }
        if self.queue_size_limit == 0 {
            return Err("queue_size_limit must be non-zero".to_string());
        }
        self.default_retry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_more_than_one_concurrent_request() {
        let mut config = Config::default();
        config.max_concurrent_requests = 2;
        assert!(config.validate().is_err());
    }
}
