//! Request pipeline types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::QUEUED_MESSAGE;

/// HTTP verbs the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

crate::impl_domain_enum_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

impl HttpMethod {
    /// Mutating verbs are deferred while offline, reads are not
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// Request as seen by interceptors
///
/// `url` is the endpoint path relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestConfig {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: BTreeMap::new(), body: None }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Mutating call deferred until connectivity returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    pub id: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub enqueued_at_epoch_ms: i64,
    /// Failed replay attempts so far
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedRequest {
    /// Capture a request as the caller issued it (before interceptors)
    pub fn from_config(config: RequestConfig, enqueued_at_epoch_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method: config.method,
            url: config.url,
            body: config.body,
            headers: config.headers,
            enqueued_at_epoch_ms,
            attempts: 0,
        }
    }

    pub fn to_config(&self) -> RequestConfig {
        RequestConfig {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Backend response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: Option<T>, message: Option<String>) -> Self {
        Self { success: true, data, message, error: None }
    }

    /// Result handed back for a mutating call deferred while offline
    pub fn queued() -> Self {
        Self { success: false, data: None, message: Some(QUEUED_MESSAGE.to_string()), error: None }
    }

    pub fn is_queued(&self) -> bool {
        !self.success && self.message.as_deref() == Some(QUEUED_MESSAGE)
    }
}
