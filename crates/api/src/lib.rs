//! # ClearHold App
//!
//! Application layer - commands and the composition root.
//!
//! This crate contains:
//! - Commands a UI shell calls (auth, offline queue, diagnostics)
//! - Application context (dependency injection)
//! - Logging initialisation
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
