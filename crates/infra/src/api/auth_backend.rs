//! Identity backend over REST
//!
//! Talks to the backend's `/auth/*` endpoints directly through
//! [`HttpClient`] rather than [`super::ApiClient`], so token renewal never
//! re-enters the pipeline that asks for a token.

use std::time::Duration;

use async_trait::async_trait;
use clearhold_core::AuthBackend;
use clearhold_domain::constants::{
    AUTH_MAGIC_LINK_SEND_PATH, AUTH_MAGIC_LINK_VERIFY_PATH, AUTH_PROFILE_PATH, AUTH_REFRESH_PATH,
    AUTH_SIGN_IN_PATH, AUTH_SIGN_IN_TOKEN_PATH, AUTH_SIGN_OUT_PATH,
};
use clearhold_domain::{
    ApiResponse, AuthGrant, ClearHoldError, HttpMethod, ProfileUpdate, Result, SignInSource,
    UserProfile,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::client::ApiClientConfig;
use super::envelope::{decode_error, decode_success};
use crate::http::HttpClient;

/// Profile payloads arrive either bare or wrapped as `{ "user": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfilePayload {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl From<ProfilePayload> for UserProfile {
    fn from(payload: ProfilePayload) -> Self {
        match payload {
            ProfilePayload::Wrapped { user } | ProfilePayload::Bare(user) => user,
        }
    }
}

/// [`AuthBackend`] implementation for the ClearHold REST API
pub struct HttpAuthBackend {
    http: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl HttpAuthBackend {
    pub fn new(http: HttpClient, config: &ApiClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    async fn call<T>(
        &self,
        method: HttpMethod,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url.as_str());
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let reply = tokio::time::timeout(self.timeout, self.http.send(builder))
            .await
            .map_err(|_| ClearHoldError::Timeout(timeout_ms))??;

        debug!(%method, path, status = reply.status, "auth backend replied");
        if !reply.is_success() {
            return Err(decode_error(reply.status, &reply.body));
        }
        decode_success(&reply.body)
    }

    /// Unwrap `data`, turning a `success: false` envelope into an auth error
    fn require_data<T>(response: ApiResponse<T>, what: &str) -> Result<T> {
        if !response.success {
            let reason = response
                .error
                .or(response.message)
                .unwrap_or_else(|| format!("{what} was rejected"));
            return Err(ClearHoldError::Auth(reason));
        }
        response
            .data
            .ok_or_else(|| ClearHoldError::Internal(format!("{what} response carried no data")))
    }

    fn require_success<T>(response: &ApiResponse<T>, what: &str) -> Result<()> {
        if response.success {
            return Ok(());
        }
        let reason = response
            .error
            .clone()
            .or_else(|| response.message.clone())
            .unwrap_or_else(|| format!("{what} was rejected"));
        Err(ClearHoldError::Auth(reason))
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[instrument(skip_all, fields(source = source.kind()))]
    async fn sign_in(&self, source: &SignInSource) -> Result<AuthGrant> {
        let (path, body) = match source {
            SignInSource::EmailPassword { email, password } => {
                (AUTH_SIGN_IN_PATH, json!({ "email": email, "password": password }))
            }
            SignInSource::MagicLink { email, code } => {
                (AUTH_MAGIC_LINK_VERIFY_PATH, json!({ "email": email, "code": code }))
            }
            SignInSource::IdToken { id_token } => {
                (AUTH_SIGN_IN_TOKEN_PATH, json!({ "idToken": id_token }))
            }
        };
        let response = self.call(HttpMethod::Post, path, None, Some(body)).await?;
        Self::require_data(response, "sign-in")
    }

    #[instrument(skip_all)]
    async fn refresh(&self, access_token: &str) -> Result<AuthGrant> {
        let response =
            self.call(HttpMethod::Post, AUTH_REFRESH_PATH, Some(access_token), None).await?;
        Self::require_data(response, "token refresh")
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response: ApiResponse<Value> =
            self.call(HttpMethod::Post, AUTH_SIGN_OUT_PATH, Some(access_token), None).await?;
        Self::require_success(&response, "sign-out")
    }

    #[instrument(skip_all)]
    async fn send_magic_link(&self, email: &str) -> Result<()> {
        let body = json!({ "email": email });
        let response: ApiResponse<Value> =
            self.call(HttpMethod::Post, AUTH_MAGIC_LINK_SEND_PATH, None, Some(body)).await?;
        Self::require_success(&response, "magic link request")
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        let response: ApiResponse<ProfilePayload> =
            self.call(HttpMethod::Get, AUTH_PROFILE_PATH, Some(access_token), None).await?;
        Self::require_data(response, "profile").map(UserProfile::from)
    }

    #[instrument(skip_all)]
    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile> {
        let body = serde_json::to_value(update).map_err(|err| {
            ClearHoldError::Validation(format!("profile update cannot be serialized: {err}"))
        })?;
        let response: ApiResponse<ProfilePayload> = self
            .call(HttpMethod::Put, AUTH_PROFILE_PATH, Some(access_token), Some(body))
            .await?;
        Self::require_data(response, "profile update").map(UserProfile::from)
    }
}
