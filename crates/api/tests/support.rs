//! Shared helpers for `clearhold-app` integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use clearhold_domain::ClientConfig;
use clearhold_lib::context::AppContext;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Test context backed by a mock server and a SQLite file in a temp dir
///
/// Keep `temp_dir` alive for as long as the context is used.
pub struct TestApp {
    pub ctx: AppContext,
    pub server: MockServer,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().expect("failed to create temporary test directory");
        let ctx = AppContext::new_with_config(config_for(&server, &temp_dir))
            .await
            .expect("AppContext creation should succeed");
        Self { ctx, server, temp_dir }
    }

    /// Start a second context over the same backend and storage directory
    pub async fn restart(self) -> Self {
        let Self { ctx, server, temp_dir } = self;
        ctx.shutdown().await;
        drop(ctx);

        let ctx = AppContext::new_with_config(config_for(&server, &temp_dir))
            .await
            .expect("AppContext re-creation should succeed");
        Self { ctx, server, temp_dir }
    }

    /// Mount `/auth/signin` issuing a token for `user-1`
    pub async fn mount_sign_in(&self) -> String {
        let token = token("user-1", now_ms() + HOUR_MS);
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "token": token,
                    "user": { "uid": "user-1", "email": "ada@example.com", "firstName": "Ada" }
                }
            })))
            .mount(&self.server)
            .await;
        token
    }
}

pub fn config_for(server: &MockServer, temp_dir: &TempDir) -> ClientConfig {
    ClientConfig {
        api_base_url: server.uri(),
        request_timeout_ms: 2_000,
        max_attempts: 2,
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 20,
        debug_logging: true,
        storage_path: Some(temp_dir.path().join("clearhold.db").to_string_lossy().into_owned()),
        ..ClientConfig::default()
    }
}

/// Build an unsigned JWT-shaped token expiring at `exp_ms`
pub fn token(sub: &str, exp_ms: i64) -> String {
    let payload = json!({ "sub": sub, "exp": exp_ms / 1000 });
    format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
