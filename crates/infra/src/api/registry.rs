//! In-flight request registry
//!
//! Each request registers a cancellation token under
//! `METHOD:endpoint:correlation-id`; the entry is removed when the request
//! finishes, whichever way it finishes.

use clearhold_domain::HttpMethod;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct CancellationRegistry {
    inflight: DashMap<String, CancellationToken>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a request; `parent` cancellation propagates to the new token
    pub fn register(
        &self,
        method: HttpMethod,
        endpoint: &str,
        parent: Option<&CancellationToken>,
    ) -> Registration<'_> {
        let key = format!("{method}:{endpoint}:{}", Uuid::new_v4());
        let token = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
        self.inflight.insert(key.clone(), token.clone());
        Registration { registry: self, key, token }
    }

    /// Cancel every in-flight request; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        self.cancel_where(|_| true)
    }

    /// Cancel requests whose key contains `pattern`
    pub fn cancel_matching(&self, pattern: &str) -> usize {
        self.cancel_where(|key| key.contains(pattern))
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }

    fn cancel_where(&self, predicate: impl Fn(&str) -> bool) -> usize {
        let keys: Vec<String> = self
            .inflight
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let mut cancelled = 0;
        for key in keys {
            if let Some((key, token)) = self.inflight.remove(&key) {
                debug!(request = %key, "cancelling request");
                token.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }
}

/// Live registry entry; deregisters on drop
#[derive(Debug)]
pub struct Registration<'a> {
    registry: &'a CancellationRegistry,
    key: String,
    token: CancellationToken,
}

impl Registration<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.inflight.remove(&self.key);
    }
}
