//! Shared types for the HRDesk client core
//!
//! Domain models, the unified error taxonomy, and the tolerant API
//! response envelope. Everything in this crate is pure: no I/O, no
//! ambient state.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use error::{HrError, HrResult, StateConflict, ValidationError};
pub use response::{ApiEnvelope, ListPayload};
pub use serde::{Deserialize, Serialize};
