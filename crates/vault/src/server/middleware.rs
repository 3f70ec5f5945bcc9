//! Axum middleware applied to the storage routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use tracing::{debug, error, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::auth::AuthError;

/// Verify the bearer token and bind the [`Subject`](crate::auth::Subject)
/// into the request extensions.
///
/// Any failure aborts the request with 403 and the opaque error code.
/// Trust anchor problems are logged at error level since they point at the
/// deployment, not at the caller.
pub async fn require_bearer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(v)) => Some(v.to_owned()),
        Some(Err(_)) => return reject(AuthError::MissingHeader),
    };

    match state.verifier.verify(header.as_deref()).await {
        Ok(subject) => {
            debug!(subject = subject.as_str(), "bearer token verified");
            req.extensions_mut().insert(subject);
            next.run(req).await
        }
        Err(e) => reject(e),
    }
}

fn reject(err: AuthError) -> Response {
    let code = err.code();
    if err.is_trust_anchor_problem() {
        error!(code, error = %err, "trust anchor unavailable for request");
    } else {
        warn!(code, error = %err, "bearer token rejected");
    }
    ApiError(ServiceError::Forbidden(code)).into_response()
}
