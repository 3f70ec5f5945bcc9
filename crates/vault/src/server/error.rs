//! HTTP mapping of service errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};
use tracing::error;

use crate::crypto::CipherError;
use crate::store::StoreError;

/// [`ServiceError`] as an Axum response.
///
/// The body is an [`ErrorResponse`] carrying only the public message; the
/// full error is logged for 5xx statuses.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(key) => Self(ServiceError::Conflict(format!("{key} already exists"))),
            StoreError::Database(e) => Self(ServiceError::Internal(e.to_string())),
        }
    }
}

impl From<CipherError> for ApiError {
    // Never caused by the caller's secret: the derived key does not fit the
    // cipher.
    fn from(e: CipherError) -> Self {
        Self(ServiceError::Internal(format!("cipher misconfigured: {e}")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse::new(self.0.code(), self.0.public_message());
        (status, Json(body)).into_response()
    }
}
