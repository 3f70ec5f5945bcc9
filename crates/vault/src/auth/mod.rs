//! Bearer-token authentication.
//!
//! Every request to a storage route presents `Authorization: Bearer <token>`
//! where the token is a compact ES256 JWS. The issuer claim selects a trust
//! anchor `<trust_anchor_dir>/<iss>.crt`; only after the signature verifies is
//! the subject claim trusted and handed to the handlers as a [`Subject`].
//!
//! # Security invariants
//!
//! - The accepted algorithm is pinned to ES256; the token's `alg` header is
//!   checked against it, never used to choose it.
//! - Trust anchors are re-read per request and never cached.
//! - No fallback key exists: an unknown issuer is always refused.

pub mod claims;
pub mod error;
pub mod verifier;

#[cfg(test)]
pub mod testing;

pub use error::AuthError;
pub use verifier::{TokenVerifier, VerifierConfig};

/// Verified subject of the current request.
///
/// Inserted into the request extensions by the authentication middleware;
/// storage handlers use it as the record owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(String);

impl Subject {
    /// Wrap a verified subject claim.
    pub fn new(sub: impl Into<String>) -> Self {
        Self(sub.into())
    }

    /// The subject identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
