//! Per-request field encryption: AES-256-GCM keyed by a caller-supplied secret.
//!
//! This module is free of HTTP and storage dependencies. The secret is never
//! stored; it only feeds [`kdf::derive_key`] for the duration of one call.
//!
//! # Blob format
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! A blob that does not authenticate under the given secret decrypts to
//! `None`, indistinguishable from a record that holds no value.

pub mod cipher;
pub mod kdf;

pub use cipher::{decrypt, decrypt_to_string, encrypt, CipherError, KEY_LEN};
