//! API response envelope
//!
//! The HR backend answers in several shapes depending on the endpoint
//! generation: a full envelope
//! `{"success": true, "data": {...}}` /
//! `{"success": false, "message": "...", "detail": "..."}`,
//! or a bare payload with no envelope at all. List payloads may arrive
//! as `{"data": [...]}`, `{"records": [...]}`, or a bare array.
//!
//! Everything is normalized here, once, before data reaches the core.
//! The core must branch on the `success` flag, never on HTTP status
//! alone.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{HrError, HrResult};

/// Unified API response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiEnvelope {
    /// Extract the payload from a raw response body.
    ///
    /// Bodies carrying a `success` flag are treated as envelopes; any
    /// other body is taken to be the bare payload itself.
    pub fn unwrap_payload(body: Value) -> HrResult<Value> {
        let is_envelope = body
            .as_object()
            .is_some_and(|obj| obj.get("success").is_some());
        if !is_envelope {
            return Ok(body);
        }

        let envelope: ApiEnvelope = serde_json::from_value(body)
            .map_err(|e| HrError::remote(format!("malformed response envelope: {e}")))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "request rejected by server".to_string());
            return Err(match envelope.detail {
                Some(detail) => HrError::remote_with_detail(message, detail),
                None => HrError::remote(message),
            });
        }

        envelope
            .data
            .ok_or_else(|| HrError::remote("success response carried no data"))
    }
}

/// List payload in any of the shapes the backend has been observed to
/// produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Wrapped { data: Vec<T> },
    Records { records: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListPayload<T> {
    /// Flatten to the inner list regardless of wire shape.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } => data,
            Self::Records { records } => records,
            Self::Bare(items) => items,
        }
    }
}
