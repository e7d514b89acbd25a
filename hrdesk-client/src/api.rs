//! Typed HR API surface
//!
//! [`HrApi`] is the seam between the session layer and the wire:
//! [`HttpClient`] implements it for production, tests drive the
//! session with an in-memory implementation. All payload-shape
//! tolerance lives here; the session only ever sees canonical types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{
    AttendanceEdit, AttendanceRecord, LeaveDecision, LeaveDraft, LeaveRequest, LeaveStatus,
    RawUserProfile, UserProfile,
};
use shared::response::ListPayload;
use shared::{HrError, HrResult};

use crate::http::HttpClient;

// =============================================================================
// Request DTOs
// =============================================================================

/// Optional check-in geolocation, passed through untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInRequest {
    pub employee_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutRequest {
    pub employee_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttendanceQuery {
    /// `None` lists every employee (HR/Admin view)
    pub employee_id: Option<String>,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveDecideRequest {
    pub request_id: String,
    pub decision: LeaveDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_id: Option<String>,
    pub status: Option<LeaveStatus>,
}

// =============================================================================
// HrApi trait
// =============================================================================

/// The stable logical operations of the HR backend.
#[async_trait]
pub trait HrApi: Send + Sync {
    async fn fetch_profile(&self, employee_id: &str) -> HrResult<UserProfile>;
    async fn check_in(&self, request: &CheckInRequest) -> HrResult<AttendanceRecord>;
    async fn check_out(&self, request: &CheckOutRequest) -> HrResult<AttendanceRecord>;
    async fn list_attendance(&self, query: &AttendanceQuery) -> HrResult<Vec<AttendanceRecord>>;
    async fn update_attendance(
        &self,
        record_id: &str,
        patch: &AttendanceEdit,
    ) -> HrResult<AttendanceRecord>;
    async fn submit_leave(&self, draft: &LeaveDraft) -> HrResult<LeaveRequest>;
    async fn decide_leave(&self, request: &LeaveDecideRequest) -> HrResult<LeaveRequest>;
    async fn list_leave(&self, query: &LeaveQuery) -> HrResult<Vec<LeaveRequest>>;
}

fn decode<T: serde::de::DeserializeOwned>(payload: Value, what: &str) -> HrResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| HrError::remote(format!("malformed {what} payload: {e}")))
}

fn decode_list<T: serde::de::DeserializeOwned>(payload: Value, what: &str) -> HrResult<Vec<T>> {
    let list: ListPayload<T> = decode(payload, what)?;
    Ok(list.into_vec())
}

#[async_trait]
impl HrApi for HttpClient {
    async fn fetch_profile(&self, employee_id: &str) -> HrResult<UserProfile> {
        let payload = self
            .get(&format!("api/employees/{employee_id}"), &[])
            .await?;
        let raw: RawUserProfile = decode(payload, "profile")?;
        raw.normalize()
    }

    async fn check_in(&self, request: &CheckInRequest) -> HrResult<AttendanceRecord> {
        let payload = self.post("api/attendance/check-in", request).await?;
        decode(payload, "attendance")
    }

    async fn check_out(&self, request: &CheckOutRequest) -> HrResult<AttendanceRecord> {
        let payload = self.post("api/attendance/check-out", request).await?;
        decode(payload, "attendance")
    }

    async fn list_attendance(&self, query: &AttendanceQuery) -> HrResult<Vec<AttendanceRecord>> {
        let mut params = vec![
            ("month", query.month.to_string()),
            ("year", query.year.to_string()),
        ];
        if let Some(employee_id) = &query.employee_id {
            params.push(("employee_id", employee_id.clone()));
        }
        let payload = self.get("api/attendance", &params).await?;
        decode_list(payload, "attendance list")
    }

    async fn update_attendance(
        &self,
        record_id: &str,
        patch: &AttendanceEdit,
    ) -> HrResult<AttendanceRecord> {
        let payload = self
            .post(&format!("api/attendance/{record_id}/update"), patch)
            .await?;
        decode(payload, "attendance")
    }

    async fn submit_leave(&self, draft: &LeaveDraft) -> HrResult<LeaveRequest> {
        let payload = self.post("api/leave-requests", draft).await?;
        decode(payload, "leave request")
    }

    async fn decide_leave(&self, request: &LeaveDecideRequest) -> HrResult<LeaveRequest> {
        let payload = self
            .post(
                &format!("api/leave-requests/{}/decide", request.request_id),
                request,
            )
            .await?;
        decode(payload, "leave request")
    }

    async fn list_leave(&self, query: &LeaveQuery) -> HrResult<Vec<LeaveRequest>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(employee_id) = &query.employee_id {
            params.push(("employee_id", employee_id.clone()));
        }
        if let Some(status) = query.status {
            let status = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            params.push(("status", status));
        }
        let payload = self.get("api/leave-requests", &params).await?;
        decode_list(payload, "leave list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_in_request_shape() {
        let request = CheckInRequest {
            employee_id: "e1".into(),
            timestamp: Utc::now(),
            geolocation: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("geolocation").is_none());

        let request = CheckInRequest {
            geolocation: Some(GeoPoint { lat: 1.5, lng: 2.5 }),
            ..request
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["geolocation"]["lat"], 1.5);
    }

    #[test]
    fn test_decode_list_tolerates_shapes() {
        let record = json!({
            "id": "a1",
            "employeeId": "e1",
            "date": "2024-01-02",
            "checkinTime": "2024-01-02T09:00:00Z",
            "status": "present"
        });
        for payload in [
            json!({"data": [record.clone()]}),
            json!({"records": [record.clone()]}),
            json!([record.clone()]),
        ] {
            let records: Vec<AttendanceRecord> =
                decode_list(payload, "attendance list").unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].employee_id, "e1");
        }
    }
}
