//! # carehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ResourceRepository` port defined in `carehub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Run every `save_group` call inside one SQL transaction
//!
//! ## Dependency rule
//! Depends on `carehub-app` (for port traits) and `carehub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
pub mod error;
pub mod pool;
pub mod resource_repo;

pub use pool::{Config, Database};
pub use resource_repo::SqliteResourceRepository;
