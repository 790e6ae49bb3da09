//! Error conversions for infrastructure adapters

pub mod conversions;

pub use conversions::{sql_to_storage_error, to_domain, InfraError};
