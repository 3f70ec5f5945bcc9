//! Request and response types of the public HTTP API.
//!
//! Values travel as plaintext JSON strings at this boundary; they are only
//! ever ciphertext inside the store.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Key/value endpoints
// ---------------------------------------------------------------------------

/// A plaintext key/value pair.
///
/// Request body for `POST /kv`, and response item for `GET /kv` and
/// `GET /kv/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Name of the entry, unique per caller.
    pub key: String,
    /// Plaintext value.
    pub value: String,
}

/// Request body for `PUT /kv/{name}`.
///
/// Either field may be omitted; an omitted or empty field leaves the stored
/// counterpart untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// New name for the entry.
    #[serde(default)]
    pub key: Option<String>,
    /// Replacement plaintext value.
    #[serde(default)]
    pub value: Option<String>,
}

/// Response body for successful writes. Values are never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRef {
    /// Name of the entry after the write.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`, `"V0004"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the backing store answered a ping.
    pub store_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateRequest = serde_json::from_value(json!({"value": "new"})).unwrap();
        assert!(req.key.is_none());
        assert_eq!(req.value.as_deref(), Some("new"));

        let empty: UpdateRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.key.is_none() && empty.value.is_none());
    }

    #[test]
    fn key_value_rejects_missing_value() {
        let res: Result<KeyValue, _> = serde_json::from_value(json!({"key": "db"}));
        assert!(res.is_err());
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("V0002", "forbidden");
        assert_eq!(e.code, "V0002");
        assert_eq!(e.message, "forbidden");
    }

    #[test]
    fn key_ref_serialises_only_the_key() {
        let body = serde_json::to_value(KeyRef { key: "db".into() }).unwrap();
        assert_eq!(body, json!({"key": "db"}));
    }
}
