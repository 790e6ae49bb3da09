//! Health report for the client runtime
//!
//! Aggregates per-component probes (backend, durable store, connectivity)
//! into one score a UI shell can poll.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Share of healthy components at or above which the client counts as healthy
pub const HEALTHY_THRESHOLD: f64 = 0.8;

/// Aggregated client health
///
/// # Example
/// ```no_run
/// use clearhold_lib::utils::health::{ComponentHealth, HealthStatus};
///
/// let status = HealthStatus::from_components(vec![
///     ComponentHealth::healthy("storage"),
///     ComponentHealth::unhealthy("backend", "connection refused"),
/// ]);
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub is_healthy: bool,
    /// Healthy components over total, 1.0 when there are none
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub components: Vec<ComponentHealth>,
    /// Epoch milliseconds of the probe
    pub checked_at_epoch_ms: i64,
}

impl HealthStatus {
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let score = if components.is_empty() {
            1.0
        } else {
            let healthy = components.iter().filter(|c| c.is_healthy).count();
            healthy as f64 / components.len() as f64
        };

        Self {
            is_healthy: score >= HEALTHY_THRESHOLD,
            score,
            message: None,
            components,
            checked_at_epoch_ms: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Names of the failing components, in probe order
    pub fn failing(&self) -> Vec<&str> {
        self.components.iter().filter(|c| !c.is_healthy).map(|c| c.name.as_str()).collect()
    }
}

/// Result of probing one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    /// "backend", "storage" or "connectivity"
    pub name: String,
    pub is_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
