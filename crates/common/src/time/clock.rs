//! Wall-clock abstraction for testability

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds since the UNIX epoch
    fn now_millis(&self) -> i64;
}

/// Shared handle used by components that need the current time
pub type SharedClock = Arc<dyn Clock>;

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same instant, so a clone handed to a component under test
/// moves when the test advances the original.
#[derive(Debug, Clone)]
pub struct MockClock {
    now_ms: Arc<AtomicI64>,
}

impl MockClock {
    /// Mock clock starting at the current real time
    pub fn new() -> Self {
        Self::at(SystemClock.now_millis())
    }

    /// Mock clock starting at `epoch_ms`
    pub fn at(epoch_ms: i64) -> Self {
        Self { now_ms: Arc::new(AtomicI64::new(epoch_ms)) }
    }

    /// Simulate time passing without waiting
    pub fn advance(&self, duration: Duration) {
        let delta = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    /// Jump to an absolute instant
    pub fn set_millis(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
