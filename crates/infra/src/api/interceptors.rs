//! Request interceptors
//!
//! Interceptors are pure transforms of [`RequestConfig`] applied in
//! registration order before the bearer token is attached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use clearhold_domain::RequestConfig;
use parking_lot::RwLock;

/// Transform applied to every outgoing request
pub type RequestInterceptor = Arc<dyn Fn(RequestConfig) -> RequestConfig + Send + Sync>;

type Registrations = RwLock<Vec<(u64, RequestInterceptor)>>;

/// Ordered interceptor registrations
#[derive(Default)]
pub struct InterceptorChain {
    entries: Arc<Registrations>,
    next_id: AtomicU64,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; drop the returned handle's registration with
    /// [`InterceptorHandle::unregister`]
    pub fn register<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, Arc::new(interceptor)));
        InterceptorHandle { id, entries: Arc::downgrade(&self.entries) }
    }

    /// Run every interceptor in order
    pub fn apply(&self, config: RequestConfig) -> RequestConfig {
        // Clone the list so interceptors never run under the lock
        let chain: Vec<RequestInterceptor> =
            self.entries.read().iter().map(|(_, f)| Arc::clone(f)).collect();
        chain.iter().fold(config, |config, interceptor| interceptor(config))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Removes one registration from its chain
#[derive(Debug)]
pub struct InterceptorHandle {
    id: u64,
    entries: Weak<Registrations>,
}

impl InterceptorHandle {
    /// Returns `false` when the registration or its chain is already gone
    pub fn unregister(&self) -> bool {
        let Some(entries) = self.entries.upgrade() else {
            return false;
        };
        let mut entries = entries.write();
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use clearhold_domain::HttpMethod;

    use super::*;

    #[test]
    fn test_interceptors_run_in_order() {
        let chain = InterceptorChain::new();
        chain.register(|config| config.with_header("X-Step", "one"));
        chain.register(|mut config| {
            let previous = config.headers.get("X-Step").cloned().unwrap_or_default();
            config.headers.insert("X-Step".into(), format!("{previous},two"));
            config
        });

        let config = chain.apply(RequestConfig::new(HttpMethod::Get, "/escrows"));
        assert_eq!(config.headers.get("X-Step").map(String::as_str), Some("one,two"));
    }

    #[test]
    fn test_unregister_removes_only_its_entry() {
        let chain = InterceptorChain::new();
        let first = chain.register(|config| config.with_header("X-First", "1"));
        chain.register(|config| config.with_header("X-Second", "2"));

        assert!(first.unregister());
        assert!(!first.unregister());

        let config = chain.apply(RequestConfig::new(HttpMethod::Get, "/"));
        assert!(!config.headers.contains_key("X-First"));
        assert!(config.headers.contains_key("X-Second"));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_handle_outliving_chain() {
        let chain = InterceptorChain::new();
        let handle = chain.register(|config| config);
        drop(chain);

        assert!(!handle.unregister());
    }
}
