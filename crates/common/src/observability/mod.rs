//! Observability primitives
//!
//! Structured logging goes through `tracing`. This module adds the in-memory
//! request log that backs the diagnostics export.

pub mod request_log;

pub use request_log::{RequestLog, RequestLogEntry, RequestOutcome};
