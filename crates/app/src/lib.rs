//! # carehub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **port trait** adapters must implement:
//!   - `ResourceRepository`: get, find and atomically save beds, residents,
//!     staff and shift assignments
//! - Provide the **engines** that own the core invariants:
//!   - `BedAllocationEngine`: match residents to beds, assign and release
//!     while keeping the resident ↔ bed reference consistent
//!   - `ShiftComplianceEngine`: validate and commit shifts against the daily
//!     cap and the no-overlap rule, answer roster-presence queries
//!   - `AuthorizationGuard`: role capabilities plus roster gating
//! - Expose the **use cases** through `FacilityOperationsService`
//! - Serialize mutations per contended key (`locks`)
//!
//! ## Dependency rule
//! Depends on `carehub-domain` only (plus `tokio::sync` for async locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod authorization;
pub mod bed_allocation;
pub mod locks;
pub mod ports;
pub mod services;
pub mod shift_compliance;

#[cfg(test)]
pub(crate) mod testing;
