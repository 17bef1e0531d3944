//! Pure sync logic: preset-unit diffing, version policy, payload handling.

mod diff;
mod payload;
mod version;

pub use diff::*;
pub use payload::*;
pub use version::*;
