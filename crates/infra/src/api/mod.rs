//! ClearHold backend API
//!
//! # Architecture
//!
//! - [`ApiClient`]: authenticated request pipeline (interceptors, bearer
//!   token, retry, timeout, cancellation, offline queue, request log)
//! - [`HttpAuthBackend`]: identity endpoints behind the core `AuthBackend`
//!   port
//! - Both share one [`crate::http::HttpClient`], so the cookie jar is common

pub mod auth_backend;
pub mod client;
pub mod envelope;
pub mod interceptors;
pub mod registry;

pub use auth_backend::HttpAuthBackend;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, RequestOptions};
pub use interceptors::{InterceptorChain, InterceptorHandle, RequestInterceptor};
pub use registry::CancellationRegistry;
