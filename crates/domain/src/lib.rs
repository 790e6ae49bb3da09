//! # ClearHold Domain
//!
//! Business domain types and models for the ClearHold client.
//!
//! This crate contains:
//! - Session data (`Credential`, `UserProfile`, sign-in sources)
//! - Request pipeline data (`QueuedRequest`, `ApiResponse`, `HttpMethod`)
//! - Domain error type and Result definition
//! - Client configuration and constants
//!
//! ## Architecture
//! - No dependencies on other ClearHold crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
