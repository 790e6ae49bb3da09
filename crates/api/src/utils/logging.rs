use std::time::Duration;

use clearhold_domain::{ClearHoldError, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG` and defaults to `info`. `json` switches the formatter to
/// one JSON object per line for log shipping.
///
/// # Errors
/// Returns `ClearHoldError::Config` when a subscriber is already installed or
/// `RUST_LOG` cannot be parsed.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| ClearHoldError::Config(format!("invalid log filter: {err}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json { builder.json().try_init() } else { builder.try_init() };

    installed.map_err(|err| ClearHoldError::Config(format!("tracing already initialised: {err}")))
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"auth::sign_in_with_email"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - Stable error label when the command failed.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&'static str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(error_type) => {
            warn!(command, duration_ms, error_type, "command_execution_failure");
        }
    }
}

/// Convert a `ClearHoldError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ClearHoldError) -> &'static str {
    match error {
        ClearHoldError::Validation(_) => "validation",
        ClearHoldError::Network(_) => "network",
        ClearHoldError::Timeout(_) => "timeout",
        ClearHoldError::Cancelled => "cancelled",
        ClearHoldError::Api { .. } => "api",
        ClearHoldError::Auth(_) => "auth",
        ClearHoldError::Storage(_) => "storage",
        ClearHoldError::Config(_) => "config",
        ClearHoldError::Internal(_) => "internal",
    }
}
