//! AES-256-GCM encryption and decryption of stored values.
//!
//! A fresh random 96-bit nonce is drawn from the OS CSPRNG for every call, so
//! the same value encrypted twice under the same secret yields two different
//! blobs. **Never reuse a nonce with GCM**: it breaks both confidentiality and
//! authentication.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

use super::kdf::derive_key;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
///
/// None of these can be caused by a wrong secret or a damaged blob; those
/// are ordinary "no value" outcomes of [`decrypt`].
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key handed to the cipher has the wrong width. Indicates a
    /// key-derivation/cipher mismatch, not bad caller input.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// AES-GCM encryption failed (unreachable with a valid key and nonce).
    #[error("aead operation failed")]
    AeadFailure,
}

/// Encrypt `plaintext` under the key derived from `secret`.
///
/// Returns the storable blob `nonce || ciphertext || tag`.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if the derived key does not fit
/// the cipher, or [`CipherError::AeadFailure`] on an internal AEAD error.
pub fn encrypt(plaintext: &[u8], secret: &str) -> Result<Vec<u8>, CipherError> {
    let key = derive_key(secret);
    seal(plaintext, key.as_bytes())
}

/// Decrypt a blob produced by [`encrypt`] with the key derived from `secret`.
///
/// Returns `Ok(None)` when the blob does not open under this secret: wrong
/// secret, tampered bytes, or a blob too short to hold a nonce and tag.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] only if the derived key does not
/// fit the cipher.
pub fn decrypt(blob: &[u8], secret: &str) -> Result<Option<Vec<u8>>, CipherError> {
    let key = derive_key(secret);
    open(blob, key.as_bytes())
}

/// [`decrypt`], then interpret the plaintext as UTF-8.
///
/// A plaintext that is not valid UTF-8 is reported as no value.
pub fn decrypt_to_string(blob: &[u8], secret: &str) -> Result<Option<String>, CipherError> {
    Ok(decrypt(blob, secret)?.and_then(|bytes| String::from_utf8(bytes).ok()))
}

/// Encrypt with an explicit raw key.
pub(crate) fn seal(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;

    use aes_gcm::aead::rand_core::RngCore;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt with an explicit raw key.
pub(crate) fn open(blob: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>, CipherError> {
    let cipher = build_cipher(key)?;
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Ok(None);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    Ok(cipher.decrypt(Nonce::from_slice(nonce), ciphertext).ok())
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))
}
