//! Replay of deferred requests once connectivity returns

use async_trait::async_trait;
use clearhold_domain::constants::DEFAULT_MAX_REPLAY_ATTEMPTS;
use clearhold_domain::{ClearHoldError, QueuedRequest, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::offline::OfflineQueue;

/// Transport used to resend queued requests
#[async_trait]
pub trait ReplayTarget: Send + Sync {
    /// Send one queued request as the caller originally issued it
    async fn send_queued(&self, request: &QueuedRequest) -> Result<()>;

    /// Replay stops as soon as this turns false
    fn is_online(&self) -> bool;
}

/// What to do with a request whose replay failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayDisposition {
    /// Keep it for the next replay
    Retain,
    /// Dead-letter: remove it from the queue
    Drop,
}

/// Dead-letter rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPolicy {
    /// Failed replays after which a request is dropped
    pub max_replay_attempts: u32,
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        Self { max_replay_attempts: DEFAULT_MAX_REPLAY_ATTEMPTS }
    }
}

impl ReplayPolicy {
    /// `attempts` already includes the failure being judged
    pub fn on_failure(&self, attempts: u32, error: &ClearHoldError) -> ReplayDisposition {
        let rejected = !error.is_retryable()
            && matches!(error, ClearHoldError::Api { status, .. } if (400..500).contains(status));
        if rejected || attempts >= self.max_replay_attempts {
            ReplayDisposition::Drop
        } else {
            ReplayDisposition::Retain
        }
    }
}

/// Outcome of one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Sent successfully and removed
    pub replayed: usize,
    /// Failed and kept for a later pass
    pub failed: usize,
    /// Failed and dead-lettered
    pub dropped: usize,
}

impl ReplayReport {
    pub fn attempted(&self) -> usize {
        self.replayed + self.failed + self.dropped
    }
}

/// Releases the queue's replay slot even when the pass is cancelled
struct ReplaySlot<'a>(&'a OfflineQueue);

impl Drop for ReplaySlot<'_> {
    fn drop(&mut self) {
        self.0.end_replay();
    }
}

/// Send pending requests oldest first
///
/// Requests queued while the pass runs wait for the next pass. A second call
/// made while a pass is running returns an empty report.
#[instrument(skip_all, fields(pending = queue.len()))]
pub async fn replay(
    queue: &OfflineQueue,
    target: &dyn ReplayTarget,
    policy: ReplayPolicy,
) -> ReplayReport {
    if !queue.begin_replay() {
        debug!("replay already running");
        return ReplayReport::default();
    }
    let _slot = ReplaySlot(queue);

    let mut report = ReplayReport::default();
    for request in queue.snapshot() {
        if !target.is_online() {
            info!("went offline during replay, stopping");
            break;
        }

        match target.send_queued(&request).await {
            Ok(()) => {
                queue.remove(&request.id).await;
                report.replayed += 1;
            }
            Err(err) => {
                let attempts = queue
                    .record_failure(&request.id)
                    .await
                    .unwrap_or_else(|| request.attempts.saturating_add(1));
                match policy.on_failure(attempts, &err) {
                    ReplayDisposition::Retain => {
                        debug!(
                            id = %request.id,
                            attempts,
                            error = %err,
                            "replay failed, keeping request"
                        );
                        report.failed += 1;
                    }
                    ReplayDisposition::Drop => {
                        warn!(
                            id = %request.id,
                            method = %request.method,
                            url = %request.url,
                            attempts,
                            error = %err,
                            "dropping queued request"
                        );
                        queue.remove(&request.id).await;
                        report.dropped += 1;
                    }
                }
            }
        }
    }
    info!(
        replayed = report.replayed,
        failed = report.failed,
        dropped = report.dropped,
        remaining = queue.len(),
        "replay finished"
    );
    report
}
