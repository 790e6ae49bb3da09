//! Shared helpers for `clearhold-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use clearhold_common::RetryConfig;
use clearhold_core::AccessTokenProvider;
use clearhold_domain::Result as DomainResult;
use clearhold_infra::{ApiClient, ApiClientConfig};
use wiremock::MockServer;

/// Client config pointed at `server` with short retry delays
pub fn fast_config(server: &MockServer) -> ApiClientConfig {
    ApiClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
        retry: RetryConfig::exponential(3, Duration::from_millis(10), Duration::from_millis(20)),
        debug_logging: true,
        ..ApiClientConfig::default()
    }
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(fast_config(server)).expect("client should build")
}

/// Build an unsigned JWT-shaped token expiring at `exp_ms`
pub fn token(sub: &str, exp_ms: i64) -> String {
    let payload = serde_json::json!({ "sub": sub, "exp": exp_ms / 1000 });
    format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

/// Token source that always hands out the same token
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn shared(token: &str) -> Arc<dyn AccessTokenProvider> {
        Arc::new(Self(Some(token.to_string())))
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> DomainResult<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Token source that takes `delay` before answering, like a slow refresh
pub struct SlowToken {
    pub delay: Duration,
}

#[async_trait]
impl AccessTokenProvider for SlowToken {
    async fn access_token(&self) -> DomainResult<Option<String>> {
        tokio::time::sleep(self.delay).await;
        Ok(Some("late-token".to_string()))
    }
}

/// Number of requests the server has seen
pub async fn received(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |requests| requests.len())
}
