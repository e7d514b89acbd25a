//! HRDesk Client - HR API adapter and session layer
//!
//! Wraps the HR backend's JSON-over-HTTP API behind the [`HrApi`]
//! trait and composes the per-login [`Session`]: resolved
//! authorization tier, capability gating, the attendance/leave state
//! machines, and reconciliation of the local view with server data.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use api::{
    AttendanceQuery, CheckInRequest, CheckOutRequest, GeoPoint, HrApi, LeaveDecideRequest,
    LeaveQuery,
};
pub use config::{ClientConfig, RetryPolicy, SessionPolicy};
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use session::Session;

// Re-export shared types for convenience
pub use shared::models::{
    AttendanceEdit, AttendanceRecord, AuthorizationTier, Capability, LeaveDecision, LeaveDraft,
    LeaveRequest, UserProfile,
};
pub use shared::{HrError, HrResult};
