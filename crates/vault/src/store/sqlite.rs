//! SQLite implementation of [`KvStore`].

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use super::{KvStore, StoreError, StoredRecord};

/// Default maximum connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const CREATE_KEY_VAL_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS key_val (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        key TEXT NOT NULL,
        value BLOB NOT NULL,
        UNIQUE (owner, key)
    );
"#;

/// Pooled SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or the schema cannot be applied.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create database directory {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database {}", path.display()))?;

        let store = Self { pool };
        store.apply_schema().await?;
        info!(path = %path.display(), "database ready");
        Ok(store)
    }

    /// A private in-memory database. A single connection keeps it alive.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<()> {
        sqlx::query(CREATE_KEY_VAL_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create key_val table")?;
        Ok(())
    }
}

/// Map a unique-constraint violation to [`StoreError::Duplicate`].
fn duplicate_or(err: sqlx::Error, key: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(key.to_owned()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn list(&self, owner: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let rows: Vec<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT owner, key, value FROM key_val WHERE owner = ? ORDER BY key")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(owner, key, value)| StoredRecord { owner, key, value })
            .collect())
    }

    async fn get(&self, owner: &str, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let row: Option<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT owner, key, value FROM key_val WHERE owner = ? AND key = ?")
                .bind(owner)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(owner, key, value)| StoredRecord { owner, key, value }))
    }

    async fn insert(&self, record: StoredRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO key_val (owner, key, value) VALUES (?, ?, ?)")
            .bind(&record.owner)
            .bind(&record.key)
            .bind(&record.value)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, &record.key))?;
        Ok(())
    }

    async fn update(
        &self,
        owner: &str,
        key: &str,
        new_key: Option<String>,
        new_value: Option<Vec<u8>>,
    ) -> Result<bool, StoreError> {
        let target = new_key.clone().unwrap_or_else(|| key.to_owned());
        let result = sqlx::query(
            "UPDATE key_val SET key = COALESCE(?, key), value = COALESCE(?, value) \
             WHERE owner = ? AND key = ?",
        )
        .bind(new_key)
        .bind(new_value)
        .bind(owner)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, &target))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, owner: &str, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM key_val WHERE owner = ? AND key = ?")
            .bind(owner)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
