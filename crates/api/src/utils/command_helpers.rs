//! Command execution helpers
//!
//! Provides utilities to reduce boilerplate when implementing commands with
//! timing and logging.

use std::future::Future;
use std::time::Instant;

use clearhold_domain::Result as DomainResult;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command with automatic timing and logging
///
/// Errors are converted to their user-facing message, the shape a UI shell
/// expects from a command.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn my_command(ctx: &AppContext) -> Result<SessionSnapshot, String> {
///     execute_command("auth::my_command", || async {
///         ctx.session.refresh().await?;
///         Ok(ctx.session.snapshot())
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> Result<T, String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    let elapsed = start.elapsed();
    log_command_execution(command_name, elapsed, result.as_ref().err().map(error_label));

    result.map_err(|err| err.user_message())
}

#[cfg(test)]
mod tests {
    use clearhold_domain::ClearHoldError;

    use super::*;

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let result = execute_command("test::ok", || async { Ok(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_error_becomes_user_message() {
        let result: Result<(), String> = execute_command("test::err", || async {
            Err(ClearHoldError::api(422, Some("AMOUNT".into()), "Amount too low"))
        })
        .await;

        assert_eq!(result, Err("Amount too low".to_string()));
    }
}
