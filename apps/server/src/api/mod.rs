//! HTTP endpoints.

pub mod account;
pub mod entitlements;
pub mod sync;

#[cfg(test)]
pub mod testing;
