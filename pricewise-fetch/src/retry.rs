//! Retry strategies for HTTP requests.

use std::time::Duration;

/// Strategy for retrying failed requests.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            exponential_backoff: true,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            exponential_backoff: false,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables exponential backoff.
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay after a failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        } else {
            self.base_delay
        };

        delay.min(self.max_delay)
    }

    /// Determines if a transport error should be retried.
    pub fn should_retry(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Determines if a response status should be retried.
    pub fn should_retry_status(&self, status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}
