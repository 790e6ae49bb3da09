//! Key-value store port

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::StorageResult;

/// String key-value persistence
///
/// Values are opaque strings; callers that store structured data encode it as
/// JSON (see [`get_json`] and [`set_json`]).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or overwrite a value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete several keys
    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Shared handle to a store
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and decode a JSON value
pub async fn get_json<T>(store: &dyn KeyValueStore, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub async fn set_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> StorageResult<()>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
