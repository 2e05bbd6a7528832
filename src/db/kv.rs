use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info};

use crate::error::StoreError;

/// String key-value store on SQLite with a total-size quota
pub struct KvStore {
    pool: Pool<Sqlite>,
    quota_bytes: u64,
}

impl KvStore {
    /// Open (or create) the store and initialize the schema
    pub async fn new(database_url: &str, quota_bytes: u64) -> Result<Self, StoreError> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Single connection: one writer, and in-memory databases stay shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool, quota_bytes };
        store.init_schema().await?;

        info!("Key-value store initialized (quota: {} bytes)", quota_bytes);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read a value
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    /// Write a value, replacing any previous one.
    ///
    /// Fails without writing if the stored total would exceed the quota.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let (others,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv_store WHERE key != ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        let needed = others.max(0) as u64 + value.len() as u64;
        if needed > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota: self.quota_bytes,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Delete a value; missing keys are not an error
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Total bytes currently stored
    pub async fn used_bytes(&self) -> Result<u64, StoreError> {
        let (used,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv_store")
                .fetch_one(&self.pool)
                .await?;

        Ok(used.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store(quota: u64) -> KvStore {
        KvStore::new("sqlite::memory:", quota).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = memory_store(1024).await;

        assert_eq!(store.get("teams").await.unwrap(), None);

        store.set("teams", "[]").await.unwrap();
        store.set("teams", "[1]").await.unwrap();
        assert_eq!(store.get("teams").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.used_bytes().await.unwrap(), 3);

        store.remove("teams").await.unwrap();
        store.remove("teams").await.unwrap();
        assert_eq!(store.get("teams").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quota_counts_other_keys_only() {
        let store = memory_store(10).await;

        store.set("a", "12345").await.unwrap();
        // replacing "a" ignores its old value
        store.set("a", "1234567890").await.unwrap();

        let err = store.set("b", "x").await.unwrap_err();
        match err {
            StoreError::QuotaExceeded { key, needed, quota } => {
                assert_eq!(key, "b");
                assert_eq!(needed, 11);
                assert_eq!(quota, 10);
            }
            other => panic!("unexpected error: {}", other),
        }

        // the failed write left nothing behind
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quota_counts_bytes_not_chars() {
        let store = memory_store(4).await;
        assert!(store.set("a", "🏏").await.is_ok());
        assert!(store.set("b", "x").await.is_err());
    }
}
