//! Resilience patterns for transient failures
//!
//! Only retry timing lives here. Whether an error is retryable is a domain
//! decision made by the caller (see `ClearHoldError::is_retryable`).

pub mod backoff;

pub use backoff::{BackoffStrategy, RetryConfig, RetryDecision};
