//! Data models
//!
//! Canonical schemas for everything that crosses the API boundary,
//! plus the pure domain logic that operates on them. Wire-shape
//! tolerance (field aliases, string-or-object roles) is handled once,
//! at deserialization; the core never special-cases aliases.

pub mod attendance;
pub mod employee;
pub mod leave;
pub mod role;

// Re-exports
pub use attendance::*;
pub use employee::*;
pub use leave::*;
pub use role::*;
