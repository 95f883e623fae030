//! Normalization for the backends' response envelopes.
//!
//! The two services do not agree on a single wrapper: responses arrive
//! as `{code, message, data}`, as a bare payload, and with collections
//! under `list`, `records`, `users`, or Spring's `content` +
//! `totalElements`. The union of observed shapes is declared once here
//! and every store goes through the same normalization functions, so a
//! well-formed success response never fails on shape alone.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Envelope code the services use for logical success.
pub const SUCCESS_CODE: i64 = 200;

/// Fails with [`ApiError::Logical`] when the body is an envelope whose
/// `code` is present and not 200. Bodies without a `code` member are
/// treated as success; not every endpoint wraps its payload.
pub fn expect_success(body: &Value, fallback: &str) -> Result<(), ApiError> {
    let Some(code) = body.get("code").and_then(Value::as_i64) else {
        return Ok(());
    };
    if code == SUCCESS_CODE {
        return Ok(());
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_string());
    Err(ApiError::Logical { code, message })
}

/// Returns the envelope's `data` member when present and non-null,
/// otherwise the body unchanged.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Null) | None => Value::Object(map),
            Some(data) => data,
        },
        other => other,
    }
}

/// A flattened collection page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
}

/// Union of every collection shape the backends have been observed to
/// return. Deserialization tries the variants in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageShape<T> {
    /// The payload is the list itself.
    Bare(Vec<T>),
    /// `{list, total?}` map wrapper.
    Listed { list: Vec<T>, total: Option<u64> },
    /// MyBatis-Plus page: `{records, total?}`.
    Records { records: Vec<T>, total: Option<u64> },
    /// User-list specific wrapper: `{users, total?}`.
    Users { users: Vec<T>, total: Option<u64> },
    /// Spring `Page`: `{content, totalElements?}`.
    Paged {
        content: Vec<T>,
        #[serde(rename = "totalElements")]
        total_elements: Option<u64>,
    },
}

impl<T> PageShape<T> {
    /// The explicit count field wins; when absent, the list length.
    pub fn into_page(self) -> Page<T> {
        let (list, total) = match self {
            PageShape::Bare(list) => (list, None),
            PageShape::Listed { list, total } => (list, total),
            PageShape::Records { records, total } => (records, total),
            PageShape::Users { users, total } => (users, total),
            PageShape::Paged {
                content,
                total_elements,
            } => (content, total_elements),
        };
        let total = total.unwrap_or(list.len() as u64);
        Page { list, total }
    }
}

/// Unwraps the envelope and flattens any known collection shape.
pub fn normalize_page<T: DeserializeOwned>(body: Value) -> Result<Page<T>, ApiError> {
    let data = unwrap_data(body);
    let shape: PageShape<T> = serde_json::from_value(data)
        .map_err(|err| ApiError::Decode(format!("unrecognized collection shape: {err}")))?;
    Ok(shape.into_page())
}

/// Unwraps the envelope and decodes a plain (unpaged) list.
pub fn normalize_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ApiError> {
    let data = unwrap_data(body);
    serde_json::from_value(data).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Unwraps the envelope and decodes a single record.
pub fn normalize_item<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let data = unwrap_data(body);
    serde_json::from_value(data).map_err(|err| ApiError::Decode(err.to_string()))
}
