//! Retry timing
//!
//! Attempts are 1-based: attempt 1 is the initial call, attempt 2 the first
//! retry. The delay before retry `n` is `initial_delay * 2^(n-1)` capped at
//! `max_delay`.

use std::time::Duration;

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Doubling delay starting at `initial_delay`, never above `max_delay`
    Exponential { initial_delay: Duration, max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay before the `retry`-th retry (1-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, max_delay } => {
                let exponent = retry.saturating_sub(1).min(31);
                initial_delay.saturating_mul(1u32 << exponent).min(*max_delay)
            }
        }
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again
    RetryAfter(Duration),
    /// Give up and surface the last error
    Stop,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first (1 disables retries)
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::exponential(2, Duration::from_millis(500), Duration::from_secs(2))
    }
}

impl RetryConfig {
    pub fn exponential(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Exponential { initial_delay, max_delay },
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, backoff: BackoffStrategy::Fixed(Duration::ZERO) }
    }

    /// Decide what happens after `attempt` (1-based) failed
    ///
    /// `retryable` is the caller's classification of the failure.
    pub fn decide(&self, attempt: u32, retryable: bool) -> RetryDecision {
        if retryable && attempt < self.max_attempts {
            RetryDecision::RetryAfter(self.backoff.delay_for_retry(attempt))
        } else {
            RetryDecision::Stop
        }
    }
}
