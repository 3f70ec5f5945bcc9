//! Axum router construction.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// The storage routes sit behind bearer verification; `/health` does not.
pub fn build(state: AppState, request_timeout: Duration) -> Router {
    let kv = Router::new()
        .route("/kv", get(handlers::list).post(handlers::create))
        .route(
            "/kv/:name",
            get(handlers::fetch)
                .put(handlers::update)
                .delete(handlers::remove),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    Router::new()
        .merge(kv)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .with_state(state)
}
