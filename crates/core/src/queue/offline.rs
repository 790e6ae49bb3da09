//! FIFO of mutating requests deferred while offline
//!
//! The queue is in-memory first. When a store is attached every change is
//! mirrored under `clearhold_offline_queue` so a reload keeps pending writes;
//! a failed mirror write is logged and never surfaces to the caller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use clearhold_common::storage::{get_json, set_json, SharedStore};
use clearhold_domain::constants::STORAGE_KEY_OFFLINE_QUEUE;
use clearhold_domain::{QueuedRequest, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::from_storage_error;

/// Pending mutating requests in arrival order
pub struct OfflineQueue {
    items: Mutex<VecDeque<QueuedRequest>>,
    store: Option<SharedStore>,
    /// Orders mirror writes so the last write reflects the latest state
    persist_lock: tokio::sync::Mutex<()>,
    replaying: AtomicBool,
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineQueue {
    /// In-memory queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            store: None,
            persist_lock: tokio::sync::Mutex::new(()),
            replaying: AtomicBool::new(false),
        }
    }

    /// Queue mirrored to `store`
    pub fn with_store(store: SharedStore) -> Self {
        Self { store: Some(store), ..Self::new() }
    }

    /// Load requests persisted by a previous run ahead of anything queued
    /// since start-up; returns the number loaded
    pub async fn restore(&self) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let stored: Vec<QueuedRequest> = get_json(store.as_ref(), STORAGE_KEY_OFFLINE_QUEUE)
            .await
            .map_err(from_storage_error)?
            .unwrap_or_default();

        let loaded = {
            let mut items = self.items.lock();
            let mut merged: VecDeque<QueuedRequest> = stored
                .into_iter()
                .filter(|stored| !items.iter().any(|existing| existing.id == stored.id))
                .collect();
            let loaded = merged.len();
            merged.extend(items.drain(..));
            *items = merged;
            loaded
        };

        if loaded > 0 {
            info!(loaded, "restored offline queue");
        }
        Ok(loaded)
    }

    /// Append a request
    pub async fn add_to_queue(&self, request: QueuedRequest) {
        debug!(id = %request.id, method = %request.method, url = %request.url, "request queued");
        self.items.lock().push_back(request);
        self.persist().await;
    }

    /// Drop every pending request; returns how many were dropped
    pub async fn clear_queue(&self) -> usize {
        let cleared = {
            let mut items = self.items.lock();
            let cleared = items.len();
            items.clear();
            cleared
        };
        info!(cleared, "offline queue cleared");
        self.persist().await;
        cleared
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Copy of the pending requests, oldest first
    pub fn snapshot(&self) -> Vec<QueuedRequest> {
        self.items.lock().iter().cloned().collect()
    }

    /// Remove a request by id; returns whether it was present
    pub async fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut items = self.items.lock();
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };
        if removed {
            self.persist().await;
        }
        removed
    }

    /// Bump the failed-attempt counter; returns the new count
    pub async fn record_failure(&self, id: &str) -> Option<u32> {
        let attempts = {
            let mut items = self.items.lock();
            items.iter_mut().find(|item| item.id == id).map(|item| {
                item.attempts = item.attempts.saturating_add(1);
                item.attempts
            })
        };
        if attempts.is_some() {
            self.persist().await;
        }
        attempts
    }

    /// Claim the replay slot; `false` when a replay is already running
    pub(crate) fn begin_replay(&self) -> bool {
        self.replaying.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }

    pub(crate) fn end_replay(&self) {
        self.replaying.store(false, Ordering::SeqCst);
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let items = self.snapshot();
        let result = if items.is_empty() {
            store.remove(STORAGE_KEY_OFFLINE_QUEUE).await
        } else {
            set_json(store.as_ref(), STORAGE_KEY_OFFLINE_QUEUE, &items).await
        };
        if let Err(err) = result {
            warn!(error = %err, pending = items.len(), "failed to persist offline queue");
        }
    }
}
