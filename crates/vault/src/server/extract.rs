//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use common::ServiceError;

use super::error::ApiError;
use super::state::AppState;

/// The per-request encryption secret, read from the configured header.
///
/// Never logged: `Debug` is redacted and the value is only reachable through
/// [`VaultSecret::expose`].
pub struct VaultSecret(String);

impl VaultSecret {
    /// The raw secret, for key derivation only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for VaultSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultSecret([REDACTED])")
    }
}

#[async_trait]
impl FromRequestParts<AppState> for VaultSecret {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let name = &state.secret_header;
        let value = parts
            .headers
            .get(name)
            .ok_or_else(|| ServiceError::BadRequest(format!("missing {name} header")))?;
        let secret = value
            .to_str()
            .map_err(|_| ServiceError::BadRequest(format!("{name} header contains non-ASCII characters")))?;
        if secret.is_empty() {
            return Err(ServiceError::BadRequest(format!("{name} header is empty")).into());
        }
        Ok(Self(secret.to_owned()))
    }
}
