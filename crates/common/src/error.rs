//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Forbidden`] → 403
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::Conflict`] → 409
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed, e.g. a missing secret header or an empty key.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller could not be authenticated. Carries an opaque error code only.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// The addressed record does not exist for this caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the same key already exists for this caller.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the error response body.
    ///
    /// Authentication failures surface their opaque verifier code instead of
    /// a descriptive one.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Forbidden(code) => *code,
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to expose to callers.
    ///
    /// Forbidden and internal errors never reveal their cause.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Forbidden(_) => "forbidden".into(),
            ServiceError::Internal(_) => "internal error".into(),
            ServiceError::BadRequest(m)
            | ServiceError::NotFound(m)
            | ServiceError::Conflict(m) => m.clone(),
        }
    }
}
