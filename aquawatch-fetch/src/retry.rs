//! Retry strategies for failed refresh cycles.
//!
//! The coordinator makes exactly one attempt per cycle. Whoever schedules
//! cycles uses this to decide whether and when to try again.

use std::time::Duration;

use crate::error::{ProviderError, RefreshError};

/// Strategy for retrying failed refresh cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay between retries in seconds.
    pub base_delay_secs: u64,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
    /// Maximum delay between retries.
    pub max_delay_secs: u64,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 30,
            exponential_backoff: true,
            max_delay_secs: 600,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_secs: 0,
            exponential_backoff: false,
            max_delay_secs: 0,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, secs: u64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, secs: u64) -> Self {
        self.max_delay_secs = secs;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
            self.base_delay_secs.saturating_mul(factor)
        } else {
            self.base_delay_secs
        };

        Duration::from_secs(delay.min(self.max_delay_secs))
    }

    /// Calculates the delay after `error` on `attempt`, honoring a
    /// provider-supplied `retry_after` up to the cap.
    pub fn delay_after(&self, error: &RefreshError, attempt: u32) -> Duration {
        match error.provider_error() {
            ProviderError::RateLimited {
                retry_after: Some(secs),
            } => Duration::from_secs((*secs).min(self.max_delay_secs)),
            _ => self.delay_for_attempt(attempt),
        }
    }

    /// Determines if a failed cycle should be retried.
    ///
    /// Authentication failures never are; the credentials must change first.
    pub fn should_retry(&self, error: &RefreshError, attempt: u32) -> bool {
        !error.is_reauth_required() && attempt < self.max_attempts
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}
