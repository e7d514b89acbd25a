//! HTTP adapter for the HR API
//!
//! One configurable endpoint plus explicit retry/backoff, replacing
//! the try-primary-then-alternative pattern the older front ends
//! carried. Responses are branched on the `success` envelope flag,
//! not on HTTP status alone; a transport timeout surfaces as a typed
//! `Timeout` failure.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::response::ApiEnvelope;
use shared::{HrError, HrResult};

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{ClientError, ClientResult};

/// HTTP client for making network requests to the HR API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            timeout_secs: config.timeout,
            retry: config.retry.clone(),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Make a GET request and extract the payload
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> HrResult<Value> {
        let mut request = self.client.get(self.url(path)).query(query);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let (status, body) = self
            .dispatch(request)
            .await
            .map_err(|e| e.into_core(self.timeout_secs))?;
        extract_payload(status, body)
    }

    /// Make a POST request with JSON body and extract the payload
    pub async fn post<B: serde::Serialize>(&self, path: &str, body: &B) -> HrResult<Value> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let (status, body) = self
            .dispatch(request)
            .await
            .map_err(|e| e.into_core(self.timeout_secs))?;
        extract_payload(status, body)
    }

    /// Send with bounded exponential backoff on transport errors.
    /// Timeouts and server answers (any status) are returned as-is;
    /// only connection-level failures are retried.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ClientResult<(StatusCode, Value)> {
        let mut attempt: u32 = 1;
        loop {
            let prepared = request
                .try_clone()
                .ok_or_else(|| ClientError::InvalidResponse("request is not retryable".into()))?
                .header("x-request-id", uuid::Uuid::new_v4().to_string());

            match prepared.send().await {
                Ok(response) => {
                    let status = response.status();
                    let body: Value = response.json().await.unwrap_or(Value::Null);
                    return Ok((status, body));
                }
                Err(err) if err.is_timeout() => return Err(ClientError::Http(err)),
                Err(err) if attempt < self.retry.max_attempts => {
                    let backoff_ms = self.retry.base_backoff_ms << (attempt - 1);
                    tracing::warn!(attempt, backoff_ms, error = %err, "transport error, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
                Err(err) => return Err(ClientError::Http(err)),
            }
        }
    }
}

/// Turn a server answer into the payload value.
///
/// An enveloped body decides by its `success` flag whatever the HTTP
/// status was; a bare body is the payload on a success status and a
/// remote failure otherwise.
pub fn extract_payload(status: StatusCode, body: Value) -> HrResult<Value> {
    let enveloped = body
        .as_object()
        .is_some_and(|obj| obj.contains_key("success"));
    if enveloped {
        return ApiEnvelope::unwrap_payload(body);
    }
    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(HrError::Remote { message, detail });
    }
    Ok(body)
}
