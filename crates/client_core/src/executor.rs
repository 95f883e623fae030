//! The one place a network call is made.
//!
//! Every store action funnels through [`RequestExecutor::execute`]: it
//! composes headers, applies the request deadline, and decodes the
//! response by its declared content type. Failures come back already
//! classified as [`ApiError`]; nothing is retried here.

use std::time::Duration;

use reqwest::{header, multipart::Form, Client, Method};
use serde_json::Value;
use shared::error::ApiError;

/// Upper bound on any single request, uploads included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body variants. Multipart bodies get no explicit
/// content-type so reqwest can set the boundary.
pub enum Payload {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Decoded response body.
#[derive(Debug)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    /// The structured body, or a decode failure when the server sent
    /// something other than JSON on a success status.
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            ApiBody::Json(value) => Ok(value),
            ApiBody::Text(text) => Err(ApiError::Decode(format!(
                "expected a JSON response, got text: {text:.80}"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct RequestExecutor {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RequestExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Shortened in tests; callers otherwise keep the 30s default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<ApiBody, ApiError> {
        self.execute(Method::GET, path, query, Payload::Empty, token)
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<ApiBody, ApiError> {
        self.execute(method, path, &[], Payload::Json(body), token)
            .await
    }

    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Payload,
        token: Option<&str>,
    ) -> Result<ApiBody, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url).timeout(self.timeout);

        if !query.is_empty() {
            request = request.query(query);
        }

        request = match payload {
            Payload::Empty => request.header(header::CONTENT_TYPE, "application/json"),
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| self.classify(err))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);
        let raw = response.text().await.map_err(|err| self.classify(err))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: failure_message(is_json, &raw),
            });
        }

        if is_json {
            let value = serde_json::from_str(&raw)
                .map_err(|err| ApiError::Decode(format!("invalid JSON body: {err}")))?;
            Ok(ApiBody::Json(value))
        } else {
            Ok(ApiBody::Text(raw))
        }
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout.as_secs())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Server message when it sent one, else the raw body, else generic.
fn failure_message(is_json: bool, raw: &str) -> String {
    if is_json {
        if let Some(message) = serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_owned))
        {
            return message;
        }
    }
    if raw.trim().is_empty() {
        "request failed".to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
#[path = "tests/executor_tests.rs"]
mod tests;
