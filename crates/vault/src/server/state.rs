//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use axum::http::HeaderName;

use crate::auth::TokenVerifier;
use crate::store::KvStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped) so that Axum can clone
/// the state for each request. Nothing in here is mutable: the verifier and
/// the encryption engine keep no per-request state.
#[derive(Clone)]
pub struct AppState {
    /// Bearer-token verifier with its trust anchor directory.
    pub verifier: Arc<TokenVerifier>,
    /// Record persistence.
    pub store: Arc<dyn KvStore>,
    /// Header carrying the per-request encryption secret.
    pub secret_header: HeaderName,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(verifier: TokenVerifier, store: Arc<dyn KvStore>, secret_header: HeaderName) -> Self {
        Self {
            verifier: Arc::new(verifier),
            store,
            secret_header,
        }
    }
}
