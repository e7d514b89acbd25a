//! Attendance model
//!
//! One record per employee per calendar day, driven through
//! `NotCheckedIn -> CheckedIn -> CheckedOut`. The [`AttendanceSheet`]
//! is the session's reconciled view of the server's records: it
//! enforces the transitions locally so a double click never reaches
//! the API, but the server's returned record always overwrites the
//! local one.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HrResult, StateConflict, ValidationError};
use crate::util::round2;

/// Daily attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Weekend,
}

/// Check-in policy knobs, supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct AttendancePolicy {
    /// Check-ins after this time of day are marked late. `None`
    /// disables lateness entirely.
    pub late_cutoff: Option<NaiveTime>,
}

/// Attendance record for one (employee, calendar day) pair.
///
/// Field aliases cover the shapes older backend versions return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Server-assigned id; `None` on a provisional local record
    #[serde(default, alias = "_id", alias = "recordId", alias = "record_id")]
    pub id: Option<String>,
    #[serde(alias = "employeeId", alias = "user_id", alias = "userId")]
    pub employee_id: String,
    pub date: NaiveDate,
    #[serde(default, alias = "checkinTime", alias = "check_in", alias = "checkIn")]
    pub checkin_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "checkoutTime", alias = "check_out", alias = "checkOut")]
    pub checkout_time: Option<DateTime<Utc>>,
    /// Elapsed hours, two decimals, zero until checked out
    #[serde(default, alias = "workingHours")]
    pub working_hours: f64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl AttendanceRecord {
    /// Checked in but not yet out.
    pub fn is_open(&self) -> bool {
        self.checkin_time.is_some() && self.checkout_time.is_none()
    }

    /// Re-validate check-in/check-out ordering and recompute hours.
    fn revalidate(&mut self) -> Result<(), StateConflict> {
        match (self.checkin_time, self.checkout_time) {
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(StateConflict::InvalidOrder);
                }
                let seconds = (end - start).num_seconds() as f64;
                self.working_hours = round2(seconds / 3600.0);
            }
            _ => self.working_hours = 0.0,
        }
        Ok(())
    }

    /// The record with a correction applied, ordering re-validated
    /// and hours recomputed. The original is untouched on failure.
    pub fn with_edit(&self, patch: &AttendanceEdit) -> HrResult<AttendanceRecord> {
        let mut updated = self.clone();
        if let Some(checkin) = patch.checkin_time {
            updated.checkin_time = Some(checkin);
        }
        if let Some(checkout) = patch.checkout_time {
            updated.checkout_time = Some(checkout);
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(note) = &patch.note {
            updated.note = Some(note.clone());
        }
        updated.revalidate()?;
        Ok(updated)
    }

    fn same_identity(&self, other: &AttendanceRecord) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.employee_id == other.employee_id && self.date == other.date,
        }
    }
}

/// Correction payload for HR/Admin edits. `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Monthly aggregate over one employee's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub present_days: u32,
    pub total_hours: f64,
    pub average_hours: f64,
}

/// Status a fresh check-in gets: weekends win, then the late cutoff.
pub fn status_for_checkin(
    date: NaiveDate,
    at: DateTime<Utc>,
    policy: &AttendancePolicy,
) -> AttendanceStatus {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return AttendanceStatus::Weekend;
    }
    match policy.late_cutoff {
        Some(cutoff) if at.time() > cutoff => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

/// The session's view of attendance records.
///
/// Records are never removed, only overwritten by reconcile;
/// corrections stay visible as edits rather than deletions.
#[derive(Debug, Clone, Default)]
pub struct AttendanceSheet {
    records: Vec<AttendanceRecord>,
}

impl AttendanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// The employee's open record, if any. At most one exists.
    pub fn open_record(&self, employee_id: &str) -> Option<&AttendanceRecord> {
        self.records
            .iter()
            .find(|r| r.employee_id == employee_id && r.is_open())
    }

    pub fn find(&self, record_id: &str) -> Option<&AttendanceRecord> {
        self.records
            .iter()
            .find(|r| r.id.as_deref() == Some(record_id))
    }

    /// Guard used before dispatching a check-in remotely.
    ///
    /// A check-in is blocked while an open record exists, and also
    /// once the day already has a record: the per-day machine is
    /// terminal after check-out, and one record per (employee, day)
    /// keeps reconcile identities unambiguous.
    pub fn ensure_can_check_in(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<(), StateConflict> {
        let taken = self
            .records
            .iter()
            .any(|r| r.employee_id == employee_id && (r.is_open() || r.date == date));
        if taken {
            return Err(StateConflict::AlreadyCheckedIn {
                employee_id: employee_id.to_string(),
            });
        }
        Ok(())
    }

    /// Open a provisional record for the employee.
    ///
    /// Fails with `AlreadyCheckedIn` while an open record exists or
    /// the day is already recorded; never creates a second record for
    /// the same day.
    pub fn check_in(
        &mut self,
        employee_id: &str,
        at: DateTime<Utc>,
        policy: &AttendancePolicy,
    ) -> HrResult<AttendanceRecord> {
        let date = at.date_naive();
        self.ensure_can_check_in(employee_id, date)?;
        let record = AttendanceRecord {
            id: None,
            employee_id: employee_id.to_string(),
            date,
            checkin_time: Some(at),
            checkout_time: None,
            working_hours: 0.0,
            status: status_for_checkin(date, at, policy),
            note: None,
        };
        self.records.push(record.clone());
        Ok(record)
    }

    /// Close the employee's open record.
    pub fn check_out(&mut self, employee_id: &str, at: DateTime<Utc>) -> HrResult<AttendanceRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.is_open())
            .ok_or_else(|| StateConflict::NotCheckedIn {
                employee_id: employee_id.to_string(),
            })?;

        if record.checkin_time.is_some_and(|start| at < start) {
            return Err(StateConflict::InvalidOrder.into());
        }
        record.checkout_time = Some(at);
        record.revalidate()?;
        Ok(record.clone())
    }

    /// Apply a correction to an existing record, re-validating the
    /// ordering invariant before committing.
    pub fn edit(&mut self, record_id: &str, patch: &AttendanceEdit) -> HrResult<AttendanceRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(record_id))
            .ok_or_else(|| ValidationError::UnknownRecord {
                id: record_id.to_string(),
            })?;

        let updated = record.with_edit(patch)?;
        *record = updated.clone();
        Ok(updated)
    }

    /// Overwrite the local record with the server's canonical one
    /// (insert when unseen). Wholesale replacement: field-by-field
    /// merging could resurrect stale values.
    pub fn reconcile(&mut self, canonical: AttendanceRecord) {
        match self.records.iter_mut().find(|r| r.same_identity(&canonical)) {
            Some(local) => *local = canonical,
            None => self.records.push(canonical),
        }
    }

    /// Drop a provisional local record after a failed dispatch. Only
    /// records the server never saw are discarded; canonical records
    /// stay (corrections are edits, not deletions).
    pub fn discard(&mut self, provisional: &AttendanceRecord) {
        if provisional.id.is_some() {
            return;
        }
        self.records
            .retain(|r| r.id.is_some() || !r.same_identity(provisional));
    }

    /// Replace the whole view from a list fetch.
    pub fn reset(&mut self, records: Vec<AttendanceRecord>) {
        self.records = records;
    }

    /// Monthly aggregate: days worked, total hours, average hours per
    /// worked day. A pure fold over the sheet. Every day with a
    /// check-in counts, weekend work included; only `Absent` records
    /// stay out.
    pub fn summarize(&self, employee_id: &str, month: u32, year: i32) -> MonthlySummary {
        let mut present_days = 0u32;
        let mut total_hours = 0.0f64;
        for record in self.records.iter().filter(|r| {
            r.employee_id == employee_id
                && r.date.month() == month
                && r.date.year() == year
        }) {
            if record.checkin_time.is_some() && record.status != AttendanceStatus::Absent {
                present_days += 1;
                total_hours += record.working_hours;
            }
        }
        let average_hours = if present_days == 0 {
            0.0
        } else {
            round2(total_hours / f64::from(present_days))
        };
        MonthlySummary {
            present_days,
            total_hours: round2(total_hours),
            average_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrError;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_double_check_in_rejected() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();

        let err = sheet.check_in("e1", ts(2024, 1, 2, 9, 1), &policy).unwrap_err();
        assert!(matches!(
            err,
            HrError::Conflict(StateConflict::AlreadyCheckedIn { .. })
        ));
        // No second open record was created
        assert_eq!(sheet.records().len(), 1);
    }

    #[test]
    fn test_same_day_recheck_in_rejected() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        sheet.check_out("e1", ts(2024, 1, 2, 12, 0)).unwrap();

        // The day is terminal after check-out
        let err = sheet.check_in("e1", ts(2024, 1, 2, 13, 0), &policy).unwrap_err();
        assert!(matches!(
            err,
            HrError::Conflict(StateConflict::AlreadyCheckedIn { .. })
        ));
        assert_eq!(sheet.records().len(), 1);

        // The next day opens normally
        sheet.check_in("e1", ts(2024, 1, 3, 9, 0), &policy).unwrap();
        assert_eq!(sheet.records().len(), 2);
    }

    #[test]
    fn test_check_out_without_check_in() {
        let mut sheet = AttendanceSheet::new();
        let err = sheet.check_out("e1", ts(2024, 1, 2, 18, 0)).unwrap_err();
        assert!(matches!(
            err,
            HrError::Conflict(StateConflict::NotCheckedIn { .. })
        ));
    }

    #[test]
    fn test_check_out_before_check_in() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        let err = sheet.check_out("e1", ts(2024, 1, 2, 8, 0)).unwrap_err();
        assert!(matches!(err, HrError::Conflict(StateConflict::InvalidOrder)));
    }

    #[test]
    fn test_working_hours() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        let record = sheet.check_out("e1", ts(2024, 1, 2, 17, 30)).unwrap();
        assert_eq!(record.working_hours, 8.5);
        assert!(record.working_hours >= 0.0);
        assert!(!record.is_open());
    }

    #[test]
    fn test_late_cutoff_and_weekend() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy {
            late_cutoff: Some(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
        };

        // Tuesday, past cutoff
        let late = sheet.check_in("e1", ts(2024, 1, 2, 10, 0), &policy).unwrap();
        assert_eq!(late.status, AttendanceStatus::Late);

        // Saturday
        let weekend = sheet.check_in("e2", ts(2024, 1, 6, 10, 0), &policy).unwrap();
        assert_eq!(weekend.status, AttendanceStatus::Weekend);

        // Tuesday, before cutoff
        let present = sheet.check_in("e3", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        assert_eq!(present.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_edit_revalidates_ordering() {
        let mut sheet = AttendanceSheet::new();
        sheet.reconcile(AttendanceRecord {
            id: Some("a1".into()),
            employee_id: "e1".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            checkin_time: Some(ts(2024, 1, 2, 9, 0)),
            checkout_time: Some(ts(2024, 1, 2, 17, 0)),
            working_hours: 8.0,
            status: AttendanceStatus::Present,
            note: None,
        });

        let bad = AttendanceEdit {
            checkout_time: Some(ts(2024, 1, 2, 8, 0)),
            ..Default::default()
        };
        let err = sheet.edit("a1", &bad).unwrap_err();
        assert!(matches!(err, HrError::Conflict(StateConflict::InvalidOrder)));
        // Rejected edit left the record untouched
        assert_eq!(sheet.find("a1").unwrap().working_hours, 8.0);

        let good = AttendanceEdit {
            checkout_time: Some(ts(2024, 1, 2, 18, 0)),
            note: Some("forgot to badge out".into()),
            ..Default::default()
        };
        let updated = sheet.edit("a1", &good).unwrap();
        assert_eq!(updated.working_hours, 9.0);
        assert_eq!(updated.note.as_deref(), Some("forgot to badge out"));
    }

    #[test]
    fn test_reconcile_overwrites_wholesale() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();

        // Server answers with its canonical version of the same day
        sheet.reconcile(AttendanceRecord {
            id: Some("srv-1".into()),
            employee_id: "e1".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            checkin_time: Some(ts(2024, 1, 2, 9, 2)),
            checkout_time: None,
            working_hours: 0.0,
            status: AttendanceStatus::Present,
            note: Some("badge reader 3".into()),
        });

        assert_eq!(sheet.records().len(), 1);
        let record = sheet.find("srv-1").unwrap();
        assert_eq!(record.checkin_time, Some(ts(2024, 1, 2, 9, 2)));
    }

    #[test]
    fn test_summarize() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        for day in [2, 3, 4] {
            sheet.check_in("e1", ts(2024, 1, day, 9, 0), &policy).unwrap();
            sheet.check_out("e1", ts(2024, 1, day, 17, 0)).unwrap();
        }
        // Another employee and another month stay out of the fold
        sheet.check_in("e2", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        sheet.check_in("e1", ts(2024, 2, 1, 9, 0), &policy).unwrap();

        let summary = sheet.summarize("e1", 1, 2024);
        assert_eq!(
            summary,
            MonthlySummary {
                present_days: 3,
                total_hours: 24.0,
                average_hours: 8.0,
            }
        );

        let empty = sheet.summarize("e9", 1, 2024);
        assert_eq!(empty.present_days, 0);
        assert_eq!(empty.average_hours, 0.0);
    }

    #[test]
    fn test_summarize_counts_weekend_hours() {
        let mut sheet = AttendanceSheet::new();
        let policy = AttendancePolicy::default();
        sheet.check_in("e1", ts(2024, 1, 2, 9, 0), &policy).unwrap();
        sheet.check_out("e1", ts(2024, 1, 2, 17, 0)).unwrap();

        // Saturday shift
        let weekend = sheet.check_in("e1", ts(2024, 1, 6, 10, 0), &policy).unwrap();
        assert_eq!(weekend.status, AttendanceStatus::Weekend);
        sheet.check_out("e1", ts(2024, 1, 6, 14, 0)).unwrap();

        let summary = sheet.summarize("e1", 1, 2024);
        assert_eq!(summary.present_days, 2);
        assert_eq!(summary.total_hours, 12.0);
        assert_eq!(summary.average_hours, 6.0);
    }
}
