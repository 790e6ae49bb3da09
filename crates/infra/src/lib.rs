//! # ClearHold Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP transport
//! - The authenticated request pipeline and the REST identity backend
//! - The SQLite key-value store
//! - Configuration loading and error conversions
//!
//! ## Architecture
//! - Implements traits defined in `clearhold-core` and `clearhold-common`
//! - Contains all "impure" code (network, disk)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiClientConfig, HttpAuthBackend, InterceptorHandle,
    RequestOptions,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use storage::SqliteKeyValueStore;
