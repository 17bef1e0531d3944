//! Core sync domain for the resellkit cloud backend: preset-unit diffing,
//! version assignment, and push payload validation. Everything here is pure;
//! storage and transport live in the companion crates.

pub mod errors;
pub mod sync;
