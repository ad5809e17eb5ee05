//! Turning raw JSON bodies into typed responses.
//!
//! The backend reports application failures in-band as `{"error": "..."}`,
//! sometimes with a 200 status. That check runs before schema decoding so a
//! backend message is never mistaken for an empty payload.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ClientError;

/// Extracts the backend-supplied `error` message from a body, if present.
///
/// A `null` or blank `error` key does not count.
#[must_use]
pub fn backend_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decodes a response body into `T`.
///
/// # Errors
///
/// * [`ClientError::Backend`] if the body carries an `error` key
/// * [`ClientError::Json`] if the body does not match `T`
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ClientError> {
    if let Some(message) = backend_error(&body) {
        return Err(ClientError::Backend { message });
    }
    Ok(serde_json::from_value(body)?)
}
