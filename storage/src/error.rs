//! Mapping of sqlx / serde failures onto `gbot_core::StorageError`.

use gbot_core::StorageError;

pub(crate) fn database(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

pub(crate) fn serialization(e: serde_json::Error) -> StorageError {
    StorageError::Serialization(e.to_string())
}
