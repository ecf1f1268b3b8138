//! Opening the carehub database.
//!
//! Every open applies the pending files under `migrations/`, so a new file
//! and one written by an older build both end up on the current schema.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::StorageError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Where the facility records live.
pub struct Config {
    /// For example `sqlite:carehub.db` or `sqlite::memory:`.
    pub database_url: String,
}

impl Config {
    /// Open the database, creating the file when needed, and migrate it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] for a bad URL or an unreachable file,
    /// and [`StorageError::Migration`] when the schema cannot be applied.
    pub async fn build(self) -> Result<Database, StorageError> {
        let pool = SqlitePool::connect_with(self.connect_options()?).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(url = %self.database_url, "carehub database ready");
        Ok(Database { pool })
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, StorageError> {
        // shift_assignments.staff_id references staff(id)
        Ok(SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .foreign_keys(true))
    }
}

/// An open, migrated carehub database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
