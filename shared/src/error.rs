//! Unified error taxonomy for the HRDesk core
//!
//! Four failure families, all recoverable at the call site:
//! - [`ValidationError`]: bad input shape/range, caught before any
//!   network call
//! - [`StateConflict`]: an operation that does not fit the current
//!   state machine state (double check-in, re-deciding a request, ...)
//! - `Forbidden`: the session's authorization tier is insufficient
//! - `Remote`/`Timeout`: the API call itself failed
//!
//! Nothing in this taxonomy is fatal to the process.

use thiserror::Error;

/// Input validation failures, detected locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Leave range with `end_date < start_date`
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: String, end: String },

    /// Blank leave reason
    #[error("a reason is required")]
    EmptyReason,

    /// A required field is missing from a record crossing the boundary
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// Referenced record is not in the current view
    #[error("unknown record: {id}")]
    UnknownRecord { id: String },
}

/// State machine conflicts. Expected, recoverable outcomes: a
/// double-click or a stale view produces these, never a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateConflict {
    /// An open attendance record already exists for this employee
    #[error("employee {employee_id} is already checked in")]
    AlreadyCheckedIn { employee_id: String },

    /// No open attendance record to check out of
    #[error("employee {employee_id} is not checked in")]
    NotCheckedIn { employee_id: String },

    /// Check-out (or edited check-out) earlier than check-in
    #[error("check-out cannot precede check-in")]
    InvalidOrder,

    /// The leave request has already been approved or rejected
    #[error("leave request {request_id} is already decided")]
    AlreadyDecided { request_id: String },

    /// Another call for the same entity is still in flight
    #[error("an operation on {entity} is already in progress")]
    OperationInFlight { entity: String },
}

/// Unified error type for the core.
#[derive(Debug, Error)]
pub enum HrError {
    /// Bad input, rejected before any remote call
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid state transition
    #[error("state conflict: {0}")]
    Conflict(#[from] StateConflict),

    /// Authorization tier insufficient for the attempted action
    #[error("permission denied: {action}")]
    Forbidden { action: String },

    /// Network, parse, or non-success envelope from the remote API
    #[error("remote call failed: {message}")]
    Remote {
        message: String,
        detail: Option<String>,
    },

    /// The remote call did not complete within the configured timeout
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl HrError {
    /// Create a Forbidden error for a named action
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// Create a Remote error without detail
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            detail: None,
        }
    }

    /// Create a Remote error with detail text
    pub fn remote_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Conflicts are expected under double-submit; callers refresh and
    /// continue instead of reporting a failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type for core operations
pub type HrResult<T> = Result<T, HrError>;
