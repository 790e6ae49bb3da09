//! Online/offline flag with reconnect notification
//!
//! The host shell feeds platform connectivity events into [`ConnectivityFlag`];
//! the request pipeline reads it before every send and the offline queue
//! replays when it observes a reconnect.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

#[derive(Debug)]
struct Inner {
    online: AtomicBool,
    /// Count of offline -> online transitions
    reconnects: AtomicU64,
    notify: Notify,
}

/// Shared connectivity state; clones observe the same flag
#[derive(Debug, Clone)]
pub struct ConnectivityFlag {
    inner: Arc<Inner>,
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                online: AtomicBool::new(online),
                reconnects: AtomicU64::new(0),
                notify: Notify::new(),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Update the flag; returns true when the value changed
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.inner.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }

        if online {
            let count = self.inner.reconnects.fetch_add(1, Ordering::SeqCst) + 1;
            info!(reconnects = count, "connectivity restored");
        } else {
            info!("connectivity lost");
        }
        self.inner.notify.notify_waiters();
        true
    }

    /// Number of reconnects observed so far
    pub fn reconnect_count(&self) -> u64 {
        self.inner.reconnects.load(Ordering::SeqCst)
    }

    /// Wait until a reconnect newer than `seen` happens; returns the new count
    pub async fn wait_for_reconnect(&self, seen: u64) -> u64 {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let current = self.reconnect_count();
            if current > seen {
                return current;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_set_online_reports_changes() {
        let flag = ConnectivityFlag::default();
        assert!(flag.is_online());

        assert!(!flag.set_online(true));
        assert!(flag.set_online(false));
        assert!(!flag.is_online());
        assert!(flag.set_online(true));
        assert_eq!(flag.reconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_reconnect_wakes_on_transition() {
        let flag = ConnectivityFlag::new(false);
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.wait_for_reconnect(0).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        flag.set_online(true);

        let count = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_wait_for_reconnect_returns_immediately_when_behind() {
        let flag = ConnectivityFlag::new(false);
        flag.set_online(true);

        assert_eq!(flag.wait_for_reconnect(0).await, 1);
    }
}
