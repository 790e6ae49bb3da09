//! Connectivity, offline queue and request diagnostics commands

use clearhold_core::ReplayReport;
use clearhold_domain::QueuedRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Offline queue state for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub online: bool,
    pub pending: usize,
    /// Oldest first
    pub requests: Vec<QueuedRequest>,
}

/// Feed a platform connectivity event into the client.
///
/// Going back online wakes the replay worker. Returns whether the state
/// changed.
pub async fn set_connectivity(ctx: &AppContext, online: bool) -> Result<bool, String> {
    let changed = ctx.api.set_online(online);
    info!(online, changed, "connectivity updated");
    Ok(changed)
}

pub async fn get_queue_status(ctx: &AppContext) -> Result<QueueStatus, String> {
    let requests = ctx.api.queue().snapshot();
    Ok(QueueStatus { online: ctx.api.is_online(), pending: requests.len(), requests })
}

/// Replay the offline queue now instead of waiting for a reconnect.
pub async fn replay_offline_queue(ctx: &AppContext) -> Result<ReplayReport, String> {
    execute_command("requests::replay_offline_queue", || async {
        Ok(ctx.api.replay_queue().await)
    })
    .await
}

/// Discard every queued request; returns how many were dropped.
pub async fn clear_offline_queue(ctx: &AppContext) -> Result<usize, String> {
    execute_command("requests::clear_offline_queue", || async {
        Ok(ctx.api.clear_queue().await)
    })
    .await
}

/// Abort every in-flight request; returns how many were aborted.
pub async fn cancel_all_requests(ctx: &AppContext) -> Result<usize, String> {
    Ok(ctx.api.cancel_all_requests())
}

/// Request log as a JSON array.
pub async fn export_request_logs(ctx: &AppContext) -> Result<String, String> {
    execute_command("requests::export_request_logs", || async { ctx.api.export_logs() }).await
}

pub async fn clear_request_logs(ctx: &AppContext) -> Result<(), String> {
    ctx.api.clear_logs();
    Ok(())
}

/// Start or stop recording requests for export.
pub async fn set_debug_logging(ctx: &AppContext, enabled: bool) -> Result<(), String> {
    ctx.api.set_debug_logging(enabled);
    info!(enabled, "request logging toggled");
    Ok(())
}
