//! Authenticated request pipeline
//!
//! Every call runs: offline check, interceptors, bearer token, send. Failed
//! sends are retried when the error is transient and attempts remain; the
//! response body is decoded once at this boundary.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use clearhold_common::{
    ConnectivityFlag, RequestLog, RequestLogEntry, RequestOutcome, RetryConfig, RetryDecision,
    SharedClock, SystemClock,
};
use clearhold_core::{
    replay, AccessTokenProvider, OfflineQueue, ReplayPolicy, ReplayReport, ReplayTarget,
};
use clearhold_domain::constants::HEALTH_PATH;
use clearhold_domain::{
    ApiResponse, ClearHoldError, ClientConfig, HttpMethod, QueuedRequest, RequestConfig, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::envelope::{decode_error, decode_success};
use super::interceptors::{InterceptorChain, InterceptorHandle};
use super::registry::CancellationRegistry;
use crate::errors::to_domain;
use crate::http::{HttpClient, HttpReply};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://api.clearhold.app")
    pub base_url: String,
    /// Default per-request timeout
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Dead-letter rules for queue replay
    pub replay: ReplayPolicy,
    /// Record attempts in the exportable request log
    pub debug_logging: bool,
    pub max_log_entries: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for ApiClientConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.request_timeout_ms),
            retry: RetryConfig::exponential(
                config.max_attempts,
                Duration::from_millis(config.retry_base_delay_ms),
                Duration::from_millis(config.retry_max_delay_ms),
            ),
            replay: ReplayPolicy { max_replay_attempts: config.max_replay_attempts },
            debug_logging: config.debug_logging,
            max_log_entries: config.max_log_entries,
        }
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Replaces the client's default timeout
    pub timeout: Option<Duration>,
    /// Merged over the request's own headers
    pub headers: BTreeMap<String, String>,
    /// Caller-owned cancellation; cancelling it aborts the request
    pub cancel: Option<CancellationToken>,
    /// Send without a bearer token
    pub skip_auth: bool,
}

/// What an offline mutating call turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfflineMode {
    Enqueue,
    Fail,
}

/// API client with retry, offline queueing and request diagnostics
pub struct ApiClient {
    http: HttpClient,
    config: ApiClientConfig,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    interceptors: InterceptorChain,
    registry: CancellationRegistry,
    connectivity: ConnectivityFlag,
    queue: Arc<OfflineQueue>,
    log: RequestLog,
    clock: SharedClock,
}

impl ApiClient {
    /// Client without an auth provider, online, with an in-memory queue
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn get<T>(&self, endpoint: &str) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.request(RequestConfig::new(HttpMethod::Get, endpoint), RequestOptions::default())
            .await
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(HttpMethod::Post, endpoint, body).await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(HttpMethod::Put, endpoint, body).await
    }

    pub async fn patch<B, T>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_body(HttpMethod::Patch, endpoint, body).await
    }

    pub async fn delete<T>(&self, endpoint: &str) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.request(RequestConfig::new(HttpMethod::Delete, endpoint), RequestOptions::default())
            .await
    }

    /// Run one request through the full pipeline
    ///
    /// Offline mutating calls are queued and resolve to
    /// [`ApiResponse::queued`] without touching the network; offline reads
    /// fail with `Network("offline")`.
    #[instrument(skip(self, config, options), fields(method = %config.method, url = %config.url))]
    pub async fn request<T>(
        &self,
        config: RequestConfig,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.dispatch(config, options, OfflineMode::Enqueue).await
    }

    /// Register a request transform; runs in registration order
    pub fn add_request_interceptor<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        self.interceptors.register(interceptor)
    }

    /// Abort every in-flight request; safe to call repeatedly
    pub fn cancel_all_requests(&self) -> usize {
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "cancelled all in-flight requests");
        }
        cancelled
    }

    /// Abort in-flight requests whose endpoint contains `endpoint`
    pub fn cancel_requests_for_endpoint(&self, endpoint: &str) -> usize {
        let cancelled = self.registry.cancel_matching(endpoint);
        if cancelled > 0 {
            info!(cancelled, endpoint, "cancelled in-flight requests");
        }
        cancelled
    }

    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Request log as a JSON array
    pub fn export_logs(&self) -> Result<String> {
        self.log.export_json().map_err(to_domain)
    }

    pub fn clear_logs(&self) {
        self.log.clear();
    }

    pub fn set_debug_logging(&self, enabled: bool) {
        self.log.set_enabled(enabled);
    }

    pub fn request_log(&self) -> &RequestLog {
        &self.log
    }

    pub fn connectivity(&self) -> &ConnectivityFlag {
        &self.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Returns whether the state changed
    pub fn set_online(&self, online: bool) -> bool {
        self.connectivity.set_online(online)
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub async fn clear_queue(&self) -> usize {
        self.queue.clear_queue().await
    }

    /// Resend queued requests oldest first
    pub async fn replay_queue(&self) -> ReplayReport {
        replay(&self.queue, self, self.config.replay).await
    }

    /// Replay the queue each time connectivity comes back
    ///
    /// Requests already queued when the worker starts (restored from a
    /// previous run) are replayed straight away if the client is online.
    /// The task holds a weak reference and stops when the client is dropped
    /// or `shutdown` is cancelled.
    pub fn spawn_replay_on_reconnect(
        self: &Arc<Self>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let client = Arc::downgrade(self);
        let connectivity = self.connectivity.clone();

        tokio::spawn(async move {
            let mut seen = connectivity.reconnect_count();
            if let Some(client) = client.upgrade() {
                if client.is_online() && !client.queue.is_empty() {
                    let report = tokio::select! {
                        () = shutdown.cancelled() => None,
                        report = client.replay_queue() => Some(report),
                    };
                    if let Some(report) = report {
                        debug!(
                            replayed = report.replayed,
                            remaining = client.queue.len(),
                            "startup replay done"
                        );
                    }
                }
            }
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    count = connectivity.wait_for_reconnect(seen) => seen = count,
                }
                let Some(client) = client.upgrade() else {
                    break;
                };
                let report = client.replay_queue().await;
                debug!(
                    replayed = report.replayed,
                    remaining = client.queue.len(),
                    "reconnect replay done"
                );
            }
            debug!("replay worker stopped");
        })
    }

    /// Health check for API
    ///
    /// `Ok(false)` when the backend answers with a non-success status; an
    /// error only when it cannot be reached.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let url = self.resolve_url(HEALTH_PATH);
        let builder = self.http.request(HttpMethod::Get, url.as_str());

        let reply = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.http.send(builder))
            .await
            .map_err(|_| {
                warn!("Health check timeout");
                ClearHoldError::Timeout(duration_ms(HEALTH_CHECK_TIMEOUT))
            })?;

        match reply {
            Ok(reply) if reply.is_success() => {
                debug!("API is healthy");
                Ok(true)
            }
            Ok(reply) => {
                warn!(status = reply.status, "API returned non-success status");
                Ok(false)
            }
            Err(err) => {
                warn!(error = %err, "Health check failed");
                Err(err)
            }
        }
    }

    async fn send_with_body<B, T>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|err| {
            ClearHoldError::Validation(format!("request body cannot be serialized: {err}"))
        })?;
        let config = RequestConfig::new(method, endpoint).with_body(body);
        self.request(config, RequestOptions::default()).await
    }

    async fn dispatch<T>(
        &self,
        mut original: RequestConfig,
        options: RequestOptions,
        offline: OfflineMode,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        original.headers.extend(options.headers);

        if !self.connectivity.is_online() {
            return self.handle_offline(original, offline).await;
        }

        let mut config = self.interceptors.apply(original.clone());
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let registration =
            self.registry.register(config.method, &original.url, options.cancel.as_ref());
        let cancel = registration.token();

        // Token acquisition may itself hit the network (a refresh), so it is
        // bounded by the same timeout and cancellation as the send.
        if !options.skip_auth {
            let token = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClearHoldError::Cancelled),
                result = tokio::time::timeout(timeout, self.bearer_token()) => {
                    result.map_err(|_| ClearHoldError::Timeout(duration_ms(timeout)))??
                }
            };
            if let Some(token) = token {
                config.headers.insert("Authorization".into(), format!("Bearer {token}"));
            }
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.attempt(&config, timeout, cancel).await;
            let elapsed = started.elapsed();

            let err = match result {
                Ok(reply) => {
                    debug!(attempt, status = reply.status, "request succeeded");
                    let status = Some(reply.status);
                    self.record(&config, attempt, status, elapsed, RequestOutcome::Success, None);
                    return decode_success(&reply.body);
                }
                Err(err) => err,
            };

            if offline == OfflineMode::Enqueue
                && config.method.is_mutating()
                && matches!(err, ClearHoldError::Network(_))
                && !self.connectivity.is_online()
            {
                self.record(&config, attempt, None, elapsed, RequestOutcome::Failed, Some(&err));
                return self.handle_offline(original, offline).await;
            }

            match self.config.retry.decide(attempt, err.is_retryable()) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        delay_ms = duration_ms(delay),
                        error = %err,
                        "request failed, retrying"
                    );
                    let outcome = RequestOutcome::Retrying;
                    self.record(&config, attempt, err.status(), elapsed, outcome, Some(&err));
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            let outcome = RequestOutcome::Cancelled;
                            self.record(&config, attempt, None, Duration::ZERO, outcome, None);
                            return Err(ClearHoldError::Cancelled);
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::Stop => {
                    debug!(attempt, error = %err, "request failed");
                    let outcome = outcome_for(&err);
                    self.record(&config, attempt, err.status(), elapsed, outcome, Some(&err));
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        config: &RequestConfig,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<HttpReply> {
        let url = self.resolve_url(&config.url);
        let mut builder = self.http.request(config.method, url.as_str());
        for (name, value) in &config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &config.body {
            builder = builder.json(body);
        }

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClearHoldError::Cancelled),
            result = tokio::time::timeout(timeout, self.http.send(builder)) => {
                result.map_err(|_| ClearHoldError::Timeout(duration_ms(timeout)))??
            }
        };

        if reply.is_success() {
            Ok(reply)
        } else {
            Err(decode_error(reply.status, &reply.body))
        }
    }

    async fn handle_offline<T>(
        &self,
        original: RequestConfig,
        offline: OfflineMode,
    ) -> Result<ApiResponse<T>> {
        if offline == OfflineMode::Enqueue && original.method.is_mutating() {
            info!(method = %original.method, url = %original.url, "offline, queueing request");
            self.record(&original, 0, None, Duration::ZERO, RequestOutcome::Queued, None);
            let queued = QueuedRequest::from_config(original, self.clock.now_millis());
            self.queue.add_to_queue(queued).await;
            return Ok(ApiResponse::queued());
        }
        Err(ClearHoldError::Network("offline".into()))
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        match &self.auth {
            Some(auth) => auth.access_token().await,
            None => Ok(None),
        }
    }

    fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}/{}", self.config.base_url, endpoint)
        }
    }

    fn record(
        &self,
        config: &RequestConfig,
        attempt: u32,
        status: Option<u16>,
        elapsed: Duration,
        outcome: RequestOutcome,
        error: Option<&ClearHoldError>,
    ) {
        if !self.log.is_enabled() {
            return;
        }
        self.log.record(RequestLogEntry {
            timestamp: Utc::now(),
            method: config.method.to_string(),
            url: config.url.clone(),
            attempt,
            status,
            duration_ms: duration_ms(elapsed),
            outcome,
            error: error.map(ToString::to_string),
        });
    }
}

#[async_trait]
impl ReplayTarget for ApiClient {
    async fn send_queued(&self, request: &QueuedRequest) -> Result<()> {
        self.dispatch::<Value>(request.to_config(), RequestOptions::default(), OfflineMode::Fail)
            .await
            .map(|_| ())
    }

    fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    connectivity: Option<ConnectivityFlag>,
    queue: Option<Arc<OfflineQueue>>,
    clock: Option<SharedClock>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the bearer token source
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn connectivity(mut self, connectivity: ConnectivityFlag) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Share a queue, e.g. one mirrored to durable storage
    pub fn queue(mut self, queue: Arc<OfflineQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is empty or the HTTP client cannot be
    /// created
    pub fn build(self) -> Result<ApiClient> {
        let mut config = self.config.unwrap_or_default();
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        if config.base_url.is_empty() {
            return Err(ClearHoldError::Config("API base URL is empty".into()));
        }

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::new()?,
        };
        let log = RequestLog::new(config.max_log_entries, config.debug_logging);

        Ok(ApiClient {
            http,
            auth: self.auth,
            interceptors: InterceptorChain::new(),
            registry: CancellationRegistry::new(),
            connectivity: self.connectivity.unwrap_or_default(),
            queue: self.queue.unwrap_or_default(),
            log,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config,
        })
    }
}

fn outcome_for(err: &ClearHoldError) -> RequestOutcome {
    match err {
        ClearHoldError::Timeout(_) => RequestOutcome::Timeout,
        ClearHoldError::Cancelled => RequestOutcome::Cancelled,
        _ => RequestOutcome::Failed,
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_client_config() {
        let client_config = ClientConfig {
            api_base_url: "https://api.clearhold.app/".into(),
            max_attempts: 4,
            debug_logging: true,
            ..ClientConfig::default()
        };

        let config = ApiClientConfig::from(&client_config);
        assert_eq!(config.base_url, "https://api.clearhold.app");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.replay.max_replay_attempts, 3);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_resolve_url() {
        let config = ApiClientConfig { base_url: "http://api.test/".into(), ..Default::default() };
        let client = ApiClient::new(config).unwrap();

        assert_eq!(client.resolve_url("/escrows"), "http://api.test/escrows");
        assert_eq!(client.resolve_url("escrows"), "http://api.test/escrows");
        assert_eq!(client.resolve_url("https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_builder_rejects_empty_base_url() {
        let config = ApiClientConfig { base_url: String::new(), ..Default::default() };
        assert!(matches!(ApiClient::new(config), Err(ClearHoldError::Config(_))));
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(outcome_for(&ClearHoldError::Timeout(5)), RequestOutcome::Timeout);
        assert_eq!(outcome_for(&ClearHoldError::Cancelled), RequestOutcome::Cancelled);
        assert_eq!(outcome_for(&ClearHoldError::api(404, None, "x")), RequestOutcome::Failed);
    }
}
