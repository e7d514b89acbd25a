//! Per-login session
//!
//! One [`Session`] is constructed per authenticated user and injected
//! wherever HR operations are issued; there is no ambient current-user
//! state. The session owns the reconciled attendance/leave view,
//! recomputes the authorization tier on every profile load, gates
//! every mutating call against the capability set before any network
//! traffic, and serializes operations per entity so a double-click
//! cannot race two calls for the same attendance day or leave request.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashSet;
use shared::models::{
    resolve_tier, AttendanceEdit, AttendanceRecord, AttendanceSheet, AuthorizationTier,
    Capability, LeaveBoard, LeaveCounts, LeaveDecision, LeaveDraft, LeaveRequest, LeaveType,
    MonthlySummary, UserProfile,
};
use shared::{HrError, HrResult, StateConflict};

use crate::api::{
    AttendanceQuery, CheckInRequest, CheckOutRequest, GeoPoint, HrApi, LeaveDecideRequest,
    LeaveQuery,
};
use crate::config::SessionPolicy;

/// RAII marker for an entity with a remote call in flight.
#[derive(Debug)]
struct InFlightGuard {
    set: Arc<DashSet<String>>,
    key: String,
}

impl InFlightGuard {
    fn acquire(set: &Arc<DashSet<String>>, key: String) -> Result<Self, StateConflict> {
        if !set.insert(key.clone()) {
            return Err(StateConflict::OperationInFlight { entity: key });
        }
        Ok(Self {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// A logged-in user's HR session.
pub struct Session<A: HrApi> {
    api: A,
    policy: SessionPolicy,
    profile: UserProfile,
    tier: AuthorizationTier,
    attendance: AttendanceSheet,
    leave: LeaveBoard,
    in_flight: Arc<DashSet<String>>,
}

impl<A: HrApi> Session<A> {
    /// Open a session: fetch the profile and resolve its tier.
    pub async fn open(api: A, employee_id: &str, policy: SessionPolicy) -> HrResult<Self> {
        let profile = api.fetch_profile(employee_id).await?;
        let tier = resolve_tier(&profile, &policy.role);
        tracing::info!(employee_id = %profile.id, tier = ?tier, "session opened");

        Ok(Self {
            api,
            policy,
            profile,
            tier,
            attendance: AttendanceSheet::new(),
            leave: LeaveBoard::new(),
            in_flight: Arc::new(DashSet::new()),
        })
    }

    /// Re-fetch the profile and re-resolve the tier. The tier is
    /// never carried over from a previous profile version.
    pub async fn reload_profile(&mut self) -> HrResult<()> {
        let profile = self.api.fetch_profile(&self.profile.id).await?;
        let tier = resolve_tier(&profile, &self.policy.role);
        if tier != self.tier {
            tracing::info!(from = ?self.tier, to = ?tier, "authorization tier changed");
        }
        self.profile = profile;
        self.tier = tier;
        Ok(())
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn tier(&self) -> AuthorizationTier {
        self.tier
    }

    pub fn attendance(&self) -> &AttendanceSheet {
        &self.attendance
    }

    pub fn leave(&self) -> &LeaveBoard {
        &self.leave
    }

    /// The capability set this session may exercise. A deactivated
    /// profile has none, whatever its tier.
    pub fn permitted_actions(&self) -> BTreeSet<Capability> {
        if !self.profile.is_active {
            return BTreeSet::new();
        }
        self.tier.capabilities()
    }

    fn require(&self, capability: Capability, action: &str) -> HrResult<()> {
        if !self.permitted_actions().contains(&capability) {
            tracing::warn!(action, tier = ?self.tier, "action denied");
            return Err(HrError::forbidden(action));
        }
        Ok(())
    }

    fn attendance_key(employee_id: &str, date: NaiveDate) -> String {
        format!("attendance/{employee_id}/{date}")
    }

    // ========== Attendance ==========

    /// Check the current user in.
    ///
    /// The local state machine runs first (a duplicate check-in never
    /// reaches the API); the server's record then overwrites the
    /// provisional one.
    pub async fn check_in(
        &mut self,
        at: DateTime<Utc>,
        geolocation: Option<GeoPoint>,
    ) -> HrResult<AttendanceRecord> {
        self.require(Capability::TrackOwnAttendance, "attendance:check-in")?;
        let _guard = InFlightGuard::acquire(
            &self.in_flight,
            Self::attendance_key(&self.profile.id, at.date_naive()),
        )?;

        let provisional =
            self.attendance
                .check_in(&self.profile.id, at, &self.policy.attendance)?;

        let request = CheckInRequest {
            employee_id: self.profile.id.clone(),
            timestamp: at,
            geolocation,
        };
        match self.api.check_in(&request).await {
            Ok(canonical) => {
                tracing::info!(employee_id = %self.profile.id, date = %canonical.date, "checked in");
                self.attendance.reconcile(canonical.clone());
                Ok(canonical)
            }
            Err(err) => {
                // The server never saw this check-in; drop the
                // provisional record so the day is not locally open.
                self.attendance.discard(&provisional);
                Err(err)
            }
        }
    }

    /// Check the current user out of the open record.
    pub async fn check_out(&mut self, at: DateTime<Utc>) -> HrResult<AttendanceRecord> {
        self.require(Capability::TrackOwnAttendance, "attendance:check-out")?;
        let _guard = InFlightGuard::acquire(
            &self.in_flight,
            Self::attendance_key(&self.profile.id, at.date_naive()),
        )?;

        let before = self.attendance.open_record(&self.profile.id).cloned();
        let provisional = self.attendance.check_out(&self.profile.id, at)?;

        let request = CheckOutRequest {
            employee_id: self.profile.id.clone(),
            timestamp: at,
        };
        match self.api.check_out(&request).await {
            Ok(canonical) => {
                tracing::info!(
                    employee_id = %self.profile.id,
                    hours = provisional.working_hours,
                    "checked out"
                );
                self.attendance.reconcile(canonical.clone());
                Ok(canonical)
            }
            Err(err) => {
                if let Some(before) = before {
                    self.attendance.reconcile(before);
                }
                Err(err)
            }
        }
    }

    /// Correct an attendance record (HR/Admin).
    pub async fn edit_attendance(
        &mut self,
        record_id: &str,
        patch: AttendanceEdit,
    ) -> HrResult<AttendanceRecord> {
        self.require(Capability::EditAttendance, "attendance:edit")?;

        // Validate against the local copy when we have one, so an
        // out-of-order correction fails before any traffic.
        if let Some(existing) = self.attendance.find(record_id) {
            existing.with_edit(&patch)?;
        }

        let _guard =
            InFlightGuard::acquire(&self.in_flight, format!("attendance/edit/{record_id}"))?;
        let canonical = self.api.update_attendance(record_id, &patch).await?;
        self.attendance.reconcile(canonical.clone());
        Ok(canonical)
    }

    /// Reload the attendance view for a month.
    pub async fn refresh_attendance(&mut self, query: AttendanceQuery) -> HrResult<()> {
        if query.employee_id.as_deref() == Some(self.profile.id.as_str()) {
            self.require(Capability::ViewOwnRecords, "attendance:view")?;
        } else {
            self.require(Capability::ViewAllAttendance, "attendance:view-all")?;
        }
        let records = self.api.list_attendance(&query).await?;
        tracing::debug!(count = records.len(), "attendance view reloaded");
        self.attendance.reset(records);
        Ok(())
    }

    /// Monthly aggregate over the local view.
    pub fn attendance_summary(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> HrResult<MonthlySummary> {
        if employee_id == self.profile.id {
            self.require(Capability::ViewOwnRecords, "attendance:view")?;
        } else {
            self.require(Capability::ViewAllAttendance, "attendance:view-all")?;
        }
        Ok(self.attendance.summarize(employee_id, month, year))
    }

    // ========== Leave ==========

    /// Submit a leave request for the current user.
    pub async fn submit_leave(&mut self, draft: LeaveDraft) -> HrResult<LeaveRequest> {
        if draft.employee_id == self.profile.id {
            self.require(Capability::SubmitLeave, "leave:submit")?;
        } else {
            // Submitting on someone else's behalf is an admin action
            self.require(Capability::ManageEmployees, "leave:submit-other")?;
        }

        // Range and reason validation; no request exists on failure.
        let provisional = draft.clone().submit(Utc::now())?;

        let _guard = InFlightGuard::acquire(
            &self.in_flight,
            format!(
                "leave/submit/{}/{}",
                provisional.employee_id, provisional.start_date
            ),
        )?;
        let canonical = self.api.submit_leave(&draft).await?;
        tracing::info!(
            employee_id = %canonical.employee_id,
            days = canonical.days_requested,
            "leave request submitted"
        );
        self.leave.reconcile(canonical.clone());
        Ok(canonical)
    }

    /// Approve or reject a pending request (HR/Admin).
    ///
    /// `AlreadyDecided` from a stale view or a double-click is a
    /// recoverable outcome: refresh and continue.
    pub async fn decide_leave(
        &mut self,
        request_id: &str,
        decision: LeaveDecision,
        notes: Option<String>,
    ) -> HrResult<LeaveRequest> {
        self.require(Capability::DecideLeave, "leave:decide")?;

        if let Some(existing) = self.leave.find(request_id) {
            if !existing.is_pending() {
                tracing::warn!(request_id, "decide on an already-decided request");
                return Err(StateConflict::AlreadyDecided {
                    request_id: request_id.to_string(),
                }
                .into());
            }
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, format!("leave/{request_id}"))?;
        let request = LeaveDecideRequest {
            request_id: request_id.to_string(),
            decision,
            notes,
        };
        let canonical = self.api.decide_leave(&request).await?;
        tracing::info!(request_id, status = ?canonical.status, "leave request decided");
        self.leave.reconcile(canonical.clone());
        Ok(canonical)
    }

    /// Reload the leave view.
    pub async fn refresh_leave(&mut self, query: LeaveQuery) -> HrResult<()> {
        if query.employee_id.as_deref() == Some(self.profile.id.as_str()) {
            self.require(Capability::ViewOwnRecords, "leave:view")?;
        } else {
            self.require(Capability::DecideLeave, "leave:view-all")?;
        }
        let requests = self.api.list_leave(&query).await?;
        tracing::debug!(count = requests.len(), "leave view reloaded");
        self.leave.reset(requests);
        Ok(())
    }

    /// Dashboard counters over the local view.
    pub fn leave_counts(&self) -> std::collections::BTreeMap<LeaveType, LeaveCounts> {
        self.leave.counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_rejects_overlap() {
        let set = Arc::new(DashSet::new());
        let guard = InFlightGuard::acquire(&set, "leave/lr-1".into()).unwrap();

        let err = InFlightGuard::acquire(&set, "leave/lr-1".into()).unwrap_err();
        assert!(matches!(err, StateConflict::OperationInFlight { .. }));

        // A different entity is unaffected
        InFlightGuard::acquire(&set, "leave/lr-2".into()).unwrap();

        drop(guard);
        InFlightGuard::acquire(&set, "leave/lr-1".into()).unwrap();
    }
}
