//! Store error types.

use pricewise_core::CoreError;
use pricewise_fetch::FetchError;
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Core error, including missing pricing and validation failures.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Insert of a key that already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Patch or delete of a key that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("Storage task failed: {0}")]
    TaskFailed(String),
}

impl StoreError {
    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(_) | StoreError::TaskFailed(_) => true,
            StoreError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Errors from a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The feed could not be retrieved. Nothing was written.
    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Reading or writing the catalog failed.
    #[error("Catalog store failed: {0}")]
    Store(#[from] StoreError),
}
