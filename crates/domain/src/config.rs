//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_LOG_ENTRIES,
    DEFAULT_MAX_REPLAY_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_DELAY_MS, REFRESH_BUFFER_MS,
};

/// Client configuration
///
/// Every field has a default so partial config files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "https://api.clearhold.app")
    pub api_base_url: String,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Total attempts per request (initial try + retries)
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Renew credentials this long before they expire
    pub refresh_buffer_ms: i64,
    /// Record every request attempt in the exportable request log
    pub debug_logging: bool,
    pub max_log_entries: usize,
    /// Failed replays after which a queued request is dropped
    pub max_replay_attempts: u32,
    /// Durable key-value store location; `None` keeps state in memory
    pub storage_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            refresh_buffer_ms: REFRESH_BUFFER_MS,
            debug_logging: false,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
            max_replay_attempts: DEFAULT_MAX_REPLAY_ATTEMPTS,
            storage_path: None,
        }
    }
}
