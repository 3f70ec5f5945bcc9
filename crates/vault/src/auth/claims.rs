//! Compact token splitting and typed claim parsing.
//!
//! Everything here operates on *untrusted* input. The parsed claims are only
//! used to locate the issuer's trust anchor until the signature has been
//! verified.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Claims carried in the token payload.
///
/// All six fields must be present. `exp` and `aud` are not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token identifier.
    pub jti: String,
    /// Issuer; names the trust anchor file.
    pub iss: String,
    /// Subject; becomes the owner of stored records.
    pub sub: String,
    /// Audience.
    pub aud: String,
    /// Expiration time, seconds since the epoch.
    pub exp: i64,
    /// Issued-at time, seconds since the epoch.
    pub iat: i64,
}

impl Claims {
    /// Decode and parse a payload segment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PayloadDecode`] if the segment is not unpadded
    /// base64url, [`AuthError::ClaimsParse`] if it does not hold the claims
    /// JSON.
    pub fn from_segment(segment: &str) -> Result<Self, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| AuthError::PayloadDecode)?;
        serde_json::from_slice(&bytes).map_err(|_| AuthError::ClaimsParse)
    }
}

/// The part of the JOSE header the verifier looks at.
#[derive(Debug, Deserialize)]
struct JoseHeader {
    alg: String,
}

/// A bearer token split into its three segments.
#[derive(Debug, Clone, Copy)]
pub struct CompactToken<'a> {
    raw: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Split `raw` on `.` into header, payload and signature.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] unless there are exactly three
    /// segments.
    pub fn parse(raw: &'a str) -> Result<Self, AuthError> {
        let mut parts = raw.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Self {
                raw,
                header,
                payload,
                signature,
            }),
            _ => Err(AuthError::MalformedToken),
        }
    }

    /// The whole token as presented.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The payload (claims) segment.
    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// The signature segment.
    pub fn signature(&self) -> &'a str {
        self.signature
    }

    /// The exact bytes the signature covers: `header.payload`.
    pub fn signing_input(&self) -> &'a str {
        &self.raw[..self.header.len() + 1 + self.payload.len()]
    }

    /// Algorithm named by the token's own header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] if the header segment is not
    /// base64url JSON with an `alg` member.
    pub fn algorithm(&self) -> Result<String, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.header)
            .map_err(|_| AuthError::MalformedToken)?;
        let header: JoseHeader =
            serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;
        Ok(header.alg)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::MalformedHeader`] unless the value is exactly two
/// space-separated parts, and [`AuthError::WrongScheme`] if the first part is
/// not `bearer` in any letter case.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => {
            if scheme.eq_ignore_ascii_case("bearer") {
                Ok(token)
            } else {
                Err(AuthError::WrongScheme)
            }
        }
        _ => Err(AuthError::MalformedHeader),
    }
}
