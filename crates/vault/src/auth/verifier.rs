//! [`TokenVerifier`]: ES256 bearer-token verification against per-issuer
//! trust anchors on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use p256::ecdsa::{signature::Verifier as _, Signature, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePublicKey;
use p256::PublicKey;
use tracing::debug;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use super::claims::{bearer_token, Claims, CompactToken};
use super::error::AuthError;
use super::Subject;

/// The only accepted signature algorithm. Never taken from the token.
pub const ALGORITHM: Algorithm = Algorithm::ES256;

/// Extension of trust anchor files: `<issuer>.crt`.
pub const ANCHOR_EXTENSION: &str = "crt";

/// Immutable verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Directory holding one `<issuer>.crt` PEM public key per trusted issuer.
    pub trust_anchor_dir: PathBuf,
}

/// Verifies bearer credentials.
///
/// Stateless between calls: every verification re-reads and re-parses the
/// issuer's trust anchor.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: VerifierConfig,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier pinned to ES256.
    ///
    /// `exp`, `nbf` and `aud` are parsed but not enforced.
    pub fn new(config: VerifierConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        Self { config, validation }
    }

    /// The trust anchor directory this verifier reads from.
    pub fn trust_anchor_dir(&self) -> &Path {
        &self.config.trust_anchor_dir
    }

    /// Verify the raw `Authorization` header value and return the subject.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing step. Header-shape
    /// failures are detected before any filesystem access.
    pub async fn verify(&self, authorization: Option<&str>) -> Result<Subject, AuthError> {
        let header = authorization.ok_or(AuthError::MissingHeader)?;
        let raw = bearer_token(header)?;
        let token = CompactToken::parse(raw)?;

        // Provisional: only the issuer is used before the signature check.
        let provisional = Claims::from_segment(token.payload())?;

        let alg = token.algorithm()?;
        if alg != "ES256" {
            return Err(AuthError::UnsupportedAlgorithm(alg));
        }

        let path = self.anchor_path(&provisional.iss)?;
        let key = load_anchor(&path, &provisional.iss).await?;

        verify_signature(&token, &key)?;
        let claims = self.decode_verified(&token, &key)?;

        Ok(Subject::new(claims.sub))
    }

    /// Location of the trust anchor for `issuer`.
    ///
    /// Issuers that could escape the trust anchor directory are refused as
    /// unknown without touching the filesystem.
    fn anchor_path(&self, issuer: &str) -> Result<PathBuf, AuthError> {
        let unsafe_name = issuer.is_empty()
            || issuer == "."
            || issuer.contains("..")
            || issuer.contains(&['/', '\\', '\0'][..]);
        if unsafe_name {
            return Err(AuthError::KeyNotFound {
                issuer: issuer.to_owned(),
            });
        }
        Ok(self
            .config
            .trust_anchor_dir
            .join(format!("{issuer}.{ANCHOR_EXTENSION}")))
    }

    /// Structured verification with the same key and the pinned algorithm.
    fn decode_verified(&self, token: &CompactToken<'_>, key: &PublicKey) -> Result<Claims, AuthError> {
        let point = key.to_encoded_point(false);
        let decoding_key = DecodingKey::from_ec_der(point.as_bytes());
        jsonwebtoken::decode::<Claims>(token.raw(), &decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm("non-ES256".into()),
                _ => AuthError::TokenRejected(e),
            })
    }
}

/// Read and parse the trust anchor at `path`.
async fn load_anchor(path: &Path, issuer: &str) -> Result<PublicKey, AuthError> {
    debug!(path = %path.display(), "resolving trust anchor");
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AuthError::KeyNotFound {
                issuer: issuer.to_owned(),
            })
        }
        Err(source) => {
            return Err(AuthError::KeyRead {
                path: path.to_owned(),
                source,
            })
        }
    };
    let key_parse = || AuthError::KeyParse {
        path: path.to_owned(),
    };
    let pem = std::str::from_utf8(&bytes).map_err(|_| key_parse())?;
    if let Ok(key) = PublicKey::from_public_key_pem(pem.trim()) {
        return Ok(key);
    }
    certificate_key(&bytes).ok_or_else(key_parse)
}

/// Subject public key of the first certificate in `pem`, if it is P-256.
fn certificate_key(pem: &[u8]) -> Option<PublicKey> {
    let der = rustls_pemfile::certs(&mut std::io::BufReader::new(pem))
        .next()?
        .ok()?;
    let cert = Certificate::from_der(der.as_ref()).ok()?;
    let spki = cert.tbs_certificate.subject_public_key_info.to_der().ok()?;
    PublicKey::from_public_key_der(&spki).ok()
}

/// Raw ES256 check of the signature segment over `header.payload`.
fn verify_signature(token: &CompactToken<'_>, key: &PublicKey) -> Result<(), AuthError> {
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(token.signature())
        .map_err(|_| AuthError::SignatureInvalid)?;
    let signature = Signature::from_slice(&sig_bytes).map_err(|_| AuthError::SignatureInvalid)?;
    VerifyingKey::from(key)
        .verify(token.signing_input().as_bytes(), &signature)
        .map_err(|_| AuthError::SignatureInvalid)
}
