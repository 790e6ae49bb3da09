//! Modular common utilities shared across ClearHold crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: token-claim decoding, input validation
//! - `runtime`: clock, key-value storage, retry timing, connectivity, request
//!   log (pulls in tokio and tracing)
//! - `observability`: tracing only

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod observability;
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod storage;
#[cfg(feature = "runtime")]
pub mod sync;
#[cfg(feature = "runtime")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{decode_claims, expiry_or_default, ClaimsError, TokenClaims};
#[cfg(feature = "runtime")]
pub use observability::{RequestLog, RequestLogEntry, RequestOutcome};
#[cfg(feature = "runtime")]
pub use resilience::{BackoffStrategy, RetryConfig, RetryDecision};
#[cfg(feature = "runtime")]
pub use storage::{KeyValueStore, MemoryKeyValueStore, SharedStore, StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use sync::ConnectivityFlag;
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SharedClock, SystemClock};
#[cfg(feature = "foundation")]
pub use validation::{
    EmailValidator, FieldValidator, StringValidator, ValidationError, ValidationResult, Validator,
};
