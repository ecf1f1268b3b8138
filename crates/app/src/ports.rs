//! Port definitions: traits that adapters implement.
//!
//! The core reads and writes every record through [`ResourceRepository`];
//! the storage adapter supplies the implementation.

pub mod resource_repository;

pub use resource_repository::{Record, ResourceRepository};
