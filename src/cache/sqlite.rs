//! SQLite-backed durable store
//!
//! Records live in `records(id INTEGER PRIMARY KEY, value TEXT NOT NULL)`.
//! Every call checks a connection out of the pool for its own duration only;
//! the `PoolConnection` goes back to the pool when dropped, on success and
//! error paths alike.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Sqlite;
use tracing::{debug, info};

use super::entry::Key;
use super::store::{DurableStore, StoreCounters, StoreStats};
use crate::config::StoreConfig;
use crate::error::{Error, Result};

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )
";

/// SQLite durable store over a sqlx connection pool
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    counters: StoreCounters,
}

impl SqliteStore {
    /// Connect, create the schema and optionally empty the table.
    ///
    /// All failures here are setup failures.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let unreachable = |reason: String| Error::StoreUnreachable {
            url: config.url.clone(),
            reason,
        };

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| unreachable(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| Error::StoreSchema(format!("failed to create records table: {}", e)))?;

        if config.fresh {
            let removed = sqlx::query("DELETE FROM records")
                .execute(&pool)
                .await
                .map_err(|e| Error::StoreSchema(format!("failed to empty records table: {}", e)))?
                .rows_affected();
            debug!(removed, "Emptied records table");
        }

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Connected to SQLite durable store"
        );

        Ok(Self {
            pool,
            counters: StoreCounters::default(),
        })
    }

    async fn conn(&self, operation: &'static str, key: Key) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| Error::store_op(operation, key, e))
    }

    async fn insert_inner(&self, key: Key, value: &str) -> Result<()> {
        let mut conn = self.conn("insert", key).await?;
        sqlx::query("INSERT INTO records (id, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                let duplicate =
                    matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
                if duplicate {
                    Error::DuplicateKey(key)
                } else {
                    Error::store_op("insert", key, e)
                }
            })?;
        Ok(())
    }

    async fn retrieve_inner(&self, key: Key) -> Result<Option<String>> {
        let mut conn = self.conn("retrieve", key).await?;
        sqlx::query_scalar::<_, String>("SELECT value FROM records WHERE id = ?1")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| Error::store_op("retrieve", key, e))
    }

    async fn count_inner(&self) -> Result<u64> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::StoreQuery(e.to_string()))?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM records")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| Error::StoreQuery(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    async fn exists_inner(&self, key: Key) -> Result<bool> {
        let mut conn = self.conn("exists", key).await?;
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM records WHERE id = ?1")
            .bind(key)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| Error::store_op("exists", key, e))?;
        Ok(found > 0)
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn insert(&self, key: Key, value: &str) -> Result<()> {
        self.counters.write(self.insert_inner(key, value).await)
    }

    async fn retrieve(&self, key: Key) -> Result<Option<String>> {
        self.counters.read(self.retrieve_inner(key).await)
    }

    async fn count(&self) -> Result<u64> {
        self.counters.read(self.count_inner().await)
    }

    async fn exists(&self, key: Key) -> Result<bool> {
        self.counters.read(self.exists_inner(key).await)
    }

    fn stats(&self) -> StoreStats {
        self.counters.snapshot()
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("SQLite pool closed");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config_for(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig {
            url: format!("sqlite://{}", dir.path().join("records.db").display()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sqlite_insert_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&config_for(&dir)).await.unwrap();

        store.insert(1, "Value1").await.unwrap();
        assert_eq!(store.retrieve(1).await.unwrap().as_deref(), Some("Value1"));
        assert!(store.retrieve(2).await.unwrap().is_none());
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&config_for(&dir)).await.unwrap();

        store.insert(7, "a").await.unwrap();
        let err = store.insert(7, "b").await.unwrap_err();
        assert_matches!(err, Error::DuplicateKey(7));
        assert!(err.is_transient());
        assert_eq!(store.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_sqlite_count_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&config_for(&dir)).await.unwrap();

        for k in 0..25 {
            store.insert(k, &format!("Value{}", k)).await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 25);
        assert!(store.exists(24).await.unwrap());
        assert!(!store.exists(25).await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_records_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir);

        let store = SqliteStore::connect(&config).await.unwrap();
        store.insert(1, "persisted").await.unwrap();
        store.close().await;

        let reopened = SqliteStore::connect(&config).await.unwrap();
        assert_eq!(
            reopened.retrieve(1).await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn test_sqlite_fresh_empties_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(&dir);

        let store = SqliteStore::connect(&config).await.unwrap();
        store.insert(1, "old").await.unwrap();
        store.close().await;

        config.fresh = true;
        let reopened = SqliteStore::connect(&config).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_unreachable_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            url: format!(
                "sqlite://{}",
                dir.path().join("missing/nested/records.db").display()
            ),
            ..Default::default()
        };

        let err = SqliteStore::connect(&config).await.unwrap_err();
        assert_matches!(err, Error::StoreUnreachable { .. });
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_sqlite_calls_fail_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&config_for(&dir)).await.unwrap();
        store.close().await;

        let err = store.insert(1, "x").await.unwrap_err();
        assert_matches!(err, Error::StoreOperation { operation: "insert", key: 1, .. });
    }
}
