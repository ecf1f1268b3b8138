//! Application services: use-case implementations.
//!
//! Services take the repository port as a generic parameter and compose the
//! engines on top of it; no adapter type appears here.

pub mod facility_service;
