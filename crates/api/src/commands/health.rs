//! Health command polled by the UI shell

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

/// Probe backend, storage and connectivity.
///
/// Never fails; problems are reported per component in the returned status.
pub async fn get_app_health(ctx: &AppContext) -> Result<HealthStatus, String> {
    let status = ctx.health_check().await;
    if !status.is_healthy {
        tracing::warn!(failing = ?status.failing(), score = status.score, "client unhealthy");
    }
    Ok(status)
}
