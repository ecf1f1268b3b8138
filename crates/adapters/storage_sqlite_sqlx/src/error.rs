//! Failures raised inside the `SQLite` adapter.
//!
//! They never cross the port as-is: every [`StorageError`] is boxed into
//! [`CareHubError::Storage`] so the engines stay storage-agnostic.

use carehub_domain::error::CareHubError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// An enum column value could not be turned into its stored name.
    #[error("could not encode column value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not bring the carehub schema up to date: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for CareHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
