//! Verification failure taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Why a bearer credential was refused.
///
/// Every variant is terminal for the request and reaches the caller only as
/// a 403 with the opaque [`AuthError::code`]. The `Display` text is for
/// operator logs; it never contains key material or claim values other than
/// the issuer name.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header, or one that is not valid visible ASCII.
    #[error("authorization header missing or unreadable")]
    MissingHeader,

    /// The header does not split into exactly two space-separated parts.
    #[error("authorization header is not `<scheme> <token>`")]
    MalformedHeader,

    /// The scheme is not `bearer` (case-insensitive).
    #[error("authorization scheme is not bearer")]
    WrongScheme,

    /// The token is not three dot-separated segments, or its header segment
    /// cannot be decoded.
    #[error("bearer token is not a compact header.payload.signature token")]
    MalformedToken,

    /// The payload segment is not unpadded base64url.
    #[error("token payload is not base64url")]
    PayloadDecode,

    /// The decoded payload is not a complete claim set.
    #[error("token payload is not a complete claim set")]
    ClaimsParse,

    /// The token header names an algorithm other than ES256.
    #[error("token algorithm {0:?} is not accepted, only ES256")]
    UnsupportedAlgorithm(String),

    /// No trust anchor exists for the claimed issuer.
    #[error("no trust anchor for issuer {issuer:?}")]
    KeyNotFound {
        /// Issuer claimed by the (still unverified) token.
        issuer: String,
    },

    /// The trust anchor exists but could not be read.
    #[error("trust anchor {} could not be read", path.display())]
    KeyRead {
        /// Location of the anchor file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The trust anchor is neither a PEM P-256 public key nor a PEM
    /// certificate carrying one.
    #[error("trust anchor {} is not a PEM P-256 public key or certificate", path.display())]
    KeyParse {
        /// Location of the anchor file.
        path: PathBuf,
    },

    /// The ES256 signature does not verify under the issuer's key.
    #[error("token signature does not verify")]
    SignatureInvalid,

    /// The structured token verification refused a token that passed the
    /// raw signature check.
    #[error("token rejected by structured verification")]
    TokenRejected(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Opaque code returned to the caller.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader | AuthError::MalformedHeader => "V0001",
            AuthError::WrongScheme => "V0002",
            AuthError::KeyParse { .. } => "V0003",
            AuthError::SignatureInvalid => "V0004",
            AuthError::TokenRejected(_) => "V0005",
            AuthError::UnsupportedAlgorithm(_) => "V0006",
            AuthError::KeyRead { .. } => "V0007",
            AuthError::PayloadDecode => "V0009",
            AuthError::KeyNotFound { .. } => "V0010",
            AuthError::ClaimsParse => "V0011",
            AuthError::MalformedToken => "V0012",
        }
    }

    /// `true` for failures caused by the deployment's trust anchors rather
    /// than by the presented credential.
    pub fn is_trust_anchor_problem(&self) -> bool {
        matches!(
            self,
            AuthError::KeyNotFound { .. } | AuthError::KeyRead { .. } | AuthError::KeyParse { .. }
        )
    }
}
