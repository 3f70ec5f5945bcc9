//! Test helpers: local P-256 issuers and ES256 token signing.

use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use p256::ecdsa::{signature::Signer as _, Signature, SigningKey};
use p256::pkcs8::{EncodePublicKey, LineEnding};
use p256::PublicKey;
use serde_json::{json, Value};

/// Self-signed `CN=localhost` certificate for the public half of `signing_key(1)`.
pub const CERT_PEM: &str = include_str!("../../testdata/sta.crt");

/// SEC1 private key PEM of `signing_key(1)`, matching [`CERT_PEM`].
pub const KEY_PEM: &str = include_str!("../../testdata/sta.key");

/// Deterministic signing key; any seed in `1..=200` is a valid scalar.
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).unwrap()
}

/// Write `<dir>/<issuer>.crt` holding the public half of `key`.
pub fn write_anchor(dir: &Path, issuer: &str, key: &SigningKey) {
    let pem = PublicKey::from(key.verifying_key())
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    std::fs::write(dir.join(format!("{issuer}.crt")), pem).unwrap();
}

/// A complete claim set far from expiry.
pub fn claims(iss: &str, sub: &str) -> Value {
    json!({
        "jti": "8f1c", "iss": iss, "sub": sub, "aud": "vault",
        "exp": 4_102_444_800_i64, "iat": 1_700_000_000_i64
    })
}

/// Sign `claims` with `key`, writing `alg` into the token header.
pub fn sign(key: &SigningKey, alg: &str, claims: &Value) -> String {
    sign_with_header(key, &json!({"alg": alg, "typ": "JWT"}), claims)
}

/// Sign `claims` with `key` under an arbitrary JOSE header.
pub fn sign_with_header(key: &SigningKey, header: &Value, claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let input = format!("{header}.{payload}");
    let signature: Signature = key.sign(input.as_bytes());
    format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
