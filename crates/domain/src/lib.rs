//! # carehub-domain
//!
//! Pure domain model for the carehub resource allocation and compliance core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define **Beds** (units of occupancy, with gender and isolation constraints)
//! - Define **Residents** (people admitted to the facility)
//! - Define **Staff** and their **Roles**, mapped to capability sets
//! - Define **Shift assignments** and the wall-clock arithmetic behind them
//! - Define **Actions** (evaluated, never persisted)
//! - Define the **consistency invariants** an audit checks stored state against
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod bed;
pub mod consistency;
pub mod resident;
pub mod shift;
pub mod staff;
