//! # ClearHold Core
//!
//! Session and queue logic - no HTTP, database or platform code.
//!
//! This crate contains:
//! - Port interfaces for the identity backend and token consumers
//! - The session manager with single-flight refresh and its scheduler
//! - The offline request queue and its replay rules
//!
//! ## Architecture Principles
//! - Only depends on `clearhold-common` and `clearhold-domain`
//! - All external effects via traits
//! - Pure, testable business logic

pub mod auth;
pub mod errors;
pub mod queue;

// Re-export specific items to avoid ambiguity
pub use auth::{AccessTokenProvider, AuthBackend, SessionManager, SessionOptions, TokenStore};
pub use queue::{
    replay, OfflineQueue, ReplayDisposition, ReplayPolicy, ReplayReport, ReplayTarget,
};
