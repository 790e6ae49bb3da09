//! Durable key-value storage
//!
//! The session and offline queue persist small string values under fixed
//! keys. [`KeyValueStore`] is the seam; [`MemoryKeyValueStore`] backs tests
//! and ephemeral sessions, and `clearhold-infra` provides the SQLite store.

pub mod error;
pub mod kv;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use kv::{get_json, set_json, KeyValueStore, SharedStore};
pub use memory::MemoryKeyValueStore;
