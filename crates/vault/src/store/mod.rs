//! Persistence of encrypted key/value records.
//!
//! The store only ever sees ciphertext blobs; encryption and decryption
//! happen in the handlers with the per-request secret. Every operation is
//! scoped to an owner (the verified subject).

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

/// One stored entry. `value` is a `nonce || ciphertext || tag` blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Verified subject that owns the record.
    pub owner: String,
    /// Entry name, unique per owner.
    pub key: String,
    /// Encrypted value.
    pub value: Vec<u8>,
}

/// Errors produced by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The owner already has a record with this key.
    #[error("a record named {0:?} already exists")]
    Duplicate(String),

    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Owner-scoped key/value persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// All records of `owner`, ordered by key.
    async fn list(&self, owner: &str) -> Result<Vec<StoredRecord>, StoreError>;

    /// The record `key` of `owner`, if any.
    async fn get(&self, owner: &str, key: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Insert a new record.
    ///
    /// Fails with [`StoreError::Duplicate`] if the owner already uses the key.
    async fn insert(&self, record: StoredRecord) -> Result<(), StoreError>;

    /// Rename the record and/or replace its blob. `None` leaves a field as is.
    ///
    /// Returns `false` if the record does not exist.
    async fn update(
        &self,
        owner: &str,
        key: &str,
        new_key: Option<String>,
        new_value: Option<Vec<u8>>,
    ) -> Result<bool, StoreError>;

    /// Delete the record if it exists.
    async fn delete(&self, owner: &str, key: &str) -> Result<(), StoreError>;

    /// `true` if the backing database answers.
    async fn ping(&self) -> bool;
}
