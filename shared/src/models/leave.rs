//! Leave request model
//!
//! Lifecycle: `Pending -> {Approved, Rejected}`, terminal either way.
//! Decided requests are immutable; a repeated decide is reported as
//! `AlreadyDecided` so a double-submit caller can refresh and move on.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HrResult, StateConflict, ValidationError};
use crate::models::role::{AuthorizationTier, Capability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Emergency,
    Maternity,
    Paternity,
    Casual,
    Annual,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// The HR/Admin action on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDecision {
    Approve,
    Reject,
}

/// A leave request as submitted and tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Server-assigned id; `None` on a provisional local request
    #[serde(default, alias = "_id", alias = "requestId", alias = "request_id")]
    pub id: Option<String>,
    #[serde(alias = "employeeId", alias = "user_id", alias = "userId")]
    pub employee_id: String,
    #[serde(alias = "leaveType", alias = "type")]
    pub leave_type: LeaveType,
    #[serde(alias = "startDate", alias = "from_date", alias = "fromDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate", alias = "to_date", alias = "toDate")]
    pub end_date: NaiveDate,
    #[serde(default, alias = "isHalfDay", alias = "half_day", alias = "halfDay")]
    pub is_half_day: bool,
    #[serde(default, alias = "daysRequested", alias = "days")]
    pub days_requested: f64,
    pub reason: String,
    pub status: LeaveStatus,
    #[serde(alias = "requestedAt", alias = "created_at", alias = "createdAt")]
    pub requested_at: DateTime<Utc>,
    #[serde(default, alias = "decidedBy", alias = "approved_by", alias = "approvedBy")]
    pub decided_by: Option<String>,
    #[serde(default, alias = "decisionNotes", alias = "decision_notes")]
    pub decision_notes: Option<String>,
    #[serde(default, alias = "decidedAt")]
    pub decided_at: Option<DateTime<Utc>>,
}

/// Inclusive calendar day count for a leave range.
///
/// A half-day request only halves a single-day range; over a longer
/// range the flag has no effect on the count.
pub fn days_requested(
    start: NaiveDate,
    end: NaiveDate,
    is_half_day: bool,
) -> Result<f64, ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    let days = (end - start).num_days() + 1;
    if is_half_day && days == 1 {
        Ok(0.5)
    } else {
        Ok(days as f64)
    }
}

/// Unsubmitted leave request, as collected from the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveDraft {
    pub employee_id: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub is_half_day: bool,
}

impl LeaveDraft {
    /// Validate and turn the draft into a pending request.
    ///
    /// `InvalidRange` and `EmptyReason` are raised here, before any
    /// network traffic; no request object exists on failure.
    pub fn submit(self, at: DateTime<Utc>) -> HrResult<LeaveRequest> {
        if self.reason.trim().is_empty() {
            return Err(ValidationError::EmptyReason.into());
        }
        let days = days_requested(self.start_date, self.end_date, self.is_half_day)?;

        Ok(LeaveRequest {
            id: None,
            employee_id: self.employee_id,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            is_half_day: self.is_half_day,
            days_requested: days,
            reason: self.reason,
            status: LeaveStatus::Pending,
            requested_at: at,
            decided_by: None,
            decision_notes: None,
            decided_at: None,
        })
    }
}

impl LeaveRequest {
    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }

    /// Apply an HR/Admin decision. Terminal: a decided request never
    /// returns to pending, and a second decide fails with
    /// `AlreadyDecided` rather than being silently accepted.
    pub fn decide(
        &mut self,
        decision: LeaveDecision,
        actor_tier: AuthorizationTier,
        actor_id: &str,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> HrResult<()> {
        if !actor_tier.can(Capability::DecideLeave) {
            return Err(crate::error::HrError::forbidden("leave:decide"));
        }
        if !self.is_pending() {
            return Err(StateConflict::AlreadyDecided {
                request_id: self.id.clone().unwrap_or_default(),
            }
            .into());
        }

        self.status = match decision {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        };
        self.decided_by = Some(actor_id.to_string());
        self.decision_notes = notes;
        self.decided_at = Some(at);
        Ok(())
    }

    fn same_identity(&self, other: &LeaveRequest) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            // Provisional request matched on its submission identity
            _ => {
                self.employee_id == other.employee_id
                    && self.start_date == other.start_date
                    && self.end_date == other.end_date
                    && self.leave_type == other.leave_type
            }
        }
    }
}

/// Pending/decided counters per leave type, for dashboard badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveCounts {
    pub pending: u32,
    pub decided: u32,
}

/// Pure grouping by type and whether the request is still pending.
pub fn counts_by_type_and_status(requests: &[LeaveRequest]) -> BTreeMap<LeaveType, LeaveCounts> {
    let mut counts: BTreeMap<LeaveType, LeaveCounts> = BTreeMap::new();
    for request in requests {
        let entry = counts.entry(request.leave_type).or_default();
        if request.is_pending() {
            entry.pending += 1;
        } else {
            entry.decided += 1;
        }
    }
    counts
}

/// The session's view of leave requests.
#[derive(Debug, Clone, Default)]
pub struct LeaveBoard {
    requests: Vec<LeaveRequest>,
}

impl LeaveBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[LeaveRequest] {
        &self.requests
    }

    pub fn find(&self, request_id: &str) -> Option<&LeaveRequest> {
        self.requests
            .iter()
            .find(|r| r.id.as_deref() == Some(request_id))
    }

    /// Overwrite with the server's canonical request (insert when
    /// unseen).
    pub fn reconcile(&mut self, canonical: LeaveRequest) {
        match self
            .requests
            .iter_mut()
            .find(|r| r.same_identity(&canonical))
        {
            Some(local) => *local = canonical,
            None => self.requests.push(canonical),
        }
    }

    /// Replace the whole view from a list fetch.
    pub fn reset(&mut self, requests: Vec<LeaveRequest>) {
        self.requests = requests;
    }

    pub fn counts(&self) -> BTreeMap<LeaveType, LeaveCounts> {
        counts_by_type_and_status(&self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn draft(start: NaiveDate, end: NaiveDate, half: bool) -> LeaveDraft {
        LeaveDraft {
            employee_id: "e1".into(),
            leave_type: LeaveType::Vacation,
            start_date: start,
            end_date: end,
            reason: "family trip".into(),
            is_half_day: half,
        }
    }

    #[test]
    fn test_invalid_range_creates_nothing() {
        let result = draft(date(2024, 1, 5), date(2024, 1, 3), false).submit(now());
        assert!(matches!(
            result,
            Err(crate::error::HrError::Validation(
                ValidationError::InvalidRange { .. }
            ))
        ));
    }

    #[test]
    fn test_blank_reason_rejected() {
        let mut d = draft(date(2024, 1, 3), date(2024, 1, 5), false);
        d.reason = "   ".into();
        assert!(matches!(
            d.submit(now()),
            Err(crate::error::HrError::Validation(ValidationError::EmptyReason))
        ));
    }

    #[test]
    fn test_day_counts() {
        // Inclusive three-day range
        let request = draft(date(2024, 1, 1), date(2024, 1, 3), false)
            .submit(now())
            .unwrap();
        assert_eq!(request.days_requested, 3.0);

        // Single-day half day
        let request = draft(date(2024, 1, 1), date(2024, 1, 1), true)
            .submit(now())
            .unwrap();
        assert_eq!(request.days_requested, 0.5);

        // Half-day flag ignored over a multi-day range
        let request = draft(date(2024, 1, 1), date(2024, 1, 2), true)
            .submit(now())
            .unwrap();
        assert_eq!(request.days_requested, 2.0);
    }

    #[test]
    fn test_decide_transitions_and_idempotency() {
        let mut request = draft(date(2024, 1, 3), date(2024, 1, 5), false)
            .submit(now())
            .unwrap();
        request.id = Some("lr-1".into());
        assert!(request.is_pending());

        request
            .decide(
                LeaveDecision::Approve,
                AuthorizationTier::Hr,
                "hr-9",
                Some("enjoy".into()),
                now(),
            )
            .unwrap();
        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.decided_by.as_deref(), Some("hr-9"));
        assert_eq!(request.decided_at, Some(now()));

        // Second decide, even an identical one, is rejected
        let err = request
            .decide(LeaveDecision::Approve, AuthorizationTier::Admin, "a-1", None, now())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::HrError::Conflict(StateConflict::AlreadyDecided { .. })
        ));
        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.decided_by.as_deref(), Some("hr-9"));
    }

    #[test]
    fn test_decide_requires_elevated_tier() {
        let mut request = draft(date(2024, 1, 3), date(2024, 1, 5), false)
            .submit(now())
            .unwrap();
        let err = request
            .decide(
                LeaveDecision::Reject,
                AuthorizationTier::Employee,
                "e1",
                None,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, crate::error::HrError::Forbidden { .. }));
        assert!(request.is_pending());
    }

    #[test]
    fn test_counts_by_type_and_status() {
        let mut approved = draft(date(2024, 1, 1), date(2024, 1, 2), false)
            .submit(now())
            .unwrap();
        approved
            .decide(LeaveDecision::Approve, AuthorizationTier::Hr, "hr-9", None, now())
            .unwrap();

        let mut sick = draft(date(2024, 1, 4), date(2024, 1, 4), false);
        sick.leave_type = LeaveType::Sick;

        let requests = vec![
            approved,
            draft(date(2024, 1, 8), date(2024, 1, 9), false).submit(now()).unwrap(),
            sick.submit(now()).unwrap(),
        ];

        let counts = counts_by_type_and_status(&requests);
        assert_eq!(counts[&LeaveType::Vacation].pending, 1);
        assert_eq!(counts[&LeaveType::Vacation].decided, 1);
        assert_eq!(counts[&LeaveType::Sick].pending, 1);
        assert_eq!(counts[&LeaveType::Sick].decided, 0);
    }

    #[test]
    fn test_board_reconcile_replaces_provisional() {
        let mut board = LeaveBoard::new();
        let provisional = draft(date(2024, 1, 3), date(2024, 1, 5), false)
            .submit(now())
            .unwrap();
        board.reconcile(provisional.clone());

        let mut canonical = provisional;
        canonical.id = Some("lr-7".into());
        board.reconcile(canonical);

        assert_eq!(board.requests().len(), 1);
        assert!(board.find("lr-7").is_some());
    }
}
