//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of errors for retry and presentation logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input rejected before any network call - never retried
    Validation,
    /// Request never reached or never returned from the server - retryable
    Network,
    /// Client-side abort (timeout or explicit cancel) - not retried
    Aborted,
    /// Server errors (5xx) - retryable
    Server,
    /// Rate limiting (429) - retryable with backoff
    RateLimit,
    /// Client errors (4xx except 429) - fail fast
    Client,
    /// Session missing or rejected
    Authentication,
    /// Local storage, configuration or internal failures
    Local,
}

/// Main error type for ClearHold client operations
///
/// Decoded once at the network boundary so call sites match on variants
/// instead of probing response shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ClearHoldError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("API error ({status}): {message}")]
    Api { status: u16, code: Option<String>, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClearHoldError {
    /// Build an API error from a status code and message
    pub fn api(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api { status, code, message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) | Self::Cancelled => ErrorCategory::Aborted,
            Self::Api { status, .. } => match *status {
                429 => ErrorCategory::RateLimit,
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Storage(_) | Self::Config(_) | Self::Internal(_) => ErrorCategory::Local,
        }
    }

    /// Check if this error should be retried by the request pipeline
    ///
    /// 5xx, 429 and transport failures are transient. Every other 4xx means
    /// the request itself is wrong and must fail fast.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Server | ErrorCategory::RateLimit
        )
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for rendering as-is to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Validation(msg) | Self::Auth(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for ClearHold operations
pub type Result<T> = std::result::Result<T, ClearHoldError>;
