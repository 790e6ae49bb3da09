//! Conversions from external infrastructure errors into domain errors.

use clearhold_common::StorageError;
use clearhold_domain::ClearHoldError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClearHoldError);

impl From<InfraError> for ClearHoldError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClearHoldError> for InfraError {
    fn from(value: ClearHoldError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoClearHoldError {
    fn into_clearhold(self) -> ClearHoldError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → StorageError / ClearHoldError */
/* -------------------------------------------------------------------------- */

/// Classify a sqlite failure for the key-value store port
pub fn sql_to_storage_error(err: SqlError) -> StorageError {
    use rusqlite::ffi::ErrorCode;
    use rusqlite::Error as RE;

    match err {
        RE::SqliteFailure(inner, maybe_message) => {
            let message = maybe_message.unwrap_or_default();
            match inner.code {
                ErrorCode::DatabaseBusy => StorageError::Unavailable("database is busy".into()),
                ErrorCode::DatabaseLocked => {
                    StorageError::Unavailable("database is locked".into())
                }
                ErrorCode::CannotOpen => {
                    StorageError::Unavailable(format!("cannot open database: {message}"))
                }
                _ => StorageError::Backend(format!(
                    "sqlite failure {:?} (code {}): {}",
                    inner.code, inner.extended_code, message
                )),
            }
        }
        RE::FromSqlConversionFailure(_, _, cause) => {
            StorageError::Serialization(format!("failed to convert sqlite value: {cause}"))
        }
        RE::InvalidColumnType(_, _, ty) => {
            StorageError::Serialization(format!("invalid column type: {ty}"))
        }
        RE::InvalidPath(path) => {
            StorageError::Unavailable(format!("invalid database path: {}", path.to_string_lossy()))
        }
        other => StorageError::Backend(other.to_string()),
    }
}

impl IntoClearHoldError for StorageError {
    fn into_clearhold(self) -> ClearHoldError {
        ClearHoldError::Storage(self.to_string())
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        Self(value.into_clearhold())
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(sql_to_storage_error(value).into_clearhold())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ClearHoldError */
/* -------------------------------------------------------------------------- */

impl IntoClearHoldError for HttpError {
    fn into_clearhold(self) -> ClearHoldError {
        if self.is_timeout() {
            return ClearHoldError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ClearHoldError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return ClearHoldError::Validation(format!("invalid request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return ClearHoldError::api(code, None, message);
        }

        if self.is_decode() {
            return ClearHoldError::Internal(format!("failed to decode response: {self}"));
        }

        ClearHoldError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_clearhold())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / io */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(ClearHoldError::Internal(format!("JSON error: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(ClearHoldError::Internal(format!("I/O error: {value}")))
    }
}

/// Shorthand for `ClearHoldError::from(InfraError::from(err))`
pub fn to_domain<E>(err: E) -> ClearHoldError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
