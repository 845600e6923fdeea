//! Retry policy
//!
//! Fixed delay between attempts. `max_attempts` counts every attempt,
//! the first one included.

use crate::config::TransmissionConfig;
use crate::domain::TransmissionResult;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub retry_on_timeout: bool,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retry_on_timeout: true,
        }
    }

    pub fn from_config(config: &TransmissionConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_seconds),
            retry_on_timeout: config.retry_on_timeout,
        }
    }

    pub fn with_retry_on_timeout(mut self, retry_on_timeout: bool) -> Self {
        self.retry_on_timeout = retry_on_timeout;
        self
    }

    /// True if the failure category could succeed on another attempt
    pub fn is_retryable(&self, result: &TransmissionResult) -> bool {
        !result.success && result.is_retryable(self.retry_on_timeout)
    }

    /// True if another attempt should follow attempt number `attempt`
    pub fn should_retry(&self, result: &TransmissionResult, attempt: u32) -> bool {
        self.is_retryable(result) && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TransmissionConfig::default())
    }
}
