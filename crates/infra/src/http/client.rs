use std::time::Duration;

use clearhold_domain::{ClearHoldError, HttpMethod};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use tracing::debug;

use crate::errors::to_domain;

/// Raw result of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON HTTP transport shared by the API client and the auth backend.
///
/// Sends one attempt per call; retry, timeout and cancellation policy belong
/// to the caller. Every request carries JSON `Accept`/`Content-Type` headers
/// and the cookie store is on so backend session cookies round-trip.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ClearHoldError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: HttpMethod, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(to_reqwest_method(method), url)
    }

    /// Execute a single attempt and read the whole body.
    pub async fn send(&self, builder: RequestBuilder) -> Result<HttpReply, ClearHoldError> {
        let request = builder.build().map_err(to_domain)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            to_domain(err)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(to_domain)?;
        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");

        Ok(HttpReply { status, body })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    connect_timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    cookie_store: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: None,
            default_headers: None,
            cookie_store: true,
        }
    }
}

impl HttpClientBuilder {
    /// Transport-level ceiling; per-request timeouts are enforced by callers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Extra headers sent with every request, on top of the JSON defaults.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, ClearHoldError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(extra) = self.default_headers {
            headers.extend(extra);
        }

        let mut builder = ReqwestClient::builder()
            .connect_timeout(self.connect_timeout)
            .default_headers(headers)
            .cookie_store(self.cookie_store)
            .no_proxy();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(to_domain)?;
        Ok(HttpClient { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}
