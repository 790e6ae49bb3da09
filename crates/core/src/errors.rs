//! Mapping of shared-utility errors into the domain error

use clearhold_common::StorageError;
use clearhold_domain::ClearHoldError;

/// Lift a key-value store failure into [`ClearHoldError::Storage`]
pub fn from_storage_error(err: StorageError) -> ClearHoldError {
    ClearHoldError::Storage(err.to_string())
}
