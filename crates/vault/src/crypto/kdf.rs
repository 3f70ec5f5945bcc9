//! Per-request secret → symmetric key derivation.
//!
//! The derived key is the lowercase hex text of the MD5 digest of the secret,
//! taken as 32 raw bytes and used as an AES-256 key. This keeps existing
//! stored blobs readable.
//!
//! **Strength:** the key is 32 bytes wide but carries at most 128 bits of
//! entropy (one MD5 digest), and the derivation is a single fast hash, not an
//! iterated KDF. Callers must supply high-entropy secrets. The tests pin this
//! property so that any change to it is a deliberate, visible decision.

use md5::{Digest, Md5};

/// Key material derived from a per-request secret.
///
/// Lives only for the duration of one encrypt/decrypt call and is zeroed on
/// drop. Its width is checked when the cipher is built, not here.
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    /// Raw key bytes, for cipher construction.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the symmetric key for `secret`.
///
/// Deterministic: the same secret always yields the same key.
pub fn derive_key(secret: &str) -> DerivedKey {
    let digest = Md5::digest(secret.as_bytes());
    // 16 digest bytes → 32 hex characters
    DerivedKey(hex::encode(digest).into_bytes())
}
