//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. This module provides a `DatabasePool`
//! with a multi-connection read-only pool for concurrent reads and a
//! single-connection writer pool for serialized writes, so history and stats
//! queries never wait behind a turn being logged.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// File name of the memory database inside the data directory.
pub const DATABASE_FILE: &str = "soma.db";

const READER_CONNECTIONS: u32 = 8;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection read-only pool (up to 8) for SELECT queries.
/// - `writer`: Single-connection pool for INSERT/UPDATE/DELETE and VACUUM.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open the pools and run embedded migrations on the writer.
    ///
    /// Both pools use WAL journal mode and a 5-second busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Schema must exist before a read-only connection can open it
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }

    /// Open `{data_dir}/soma.db`, creating the directory if needed.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        tokio::fs::create_dir_all(data_dir).await?;
        Self::new(&database_url(data_dir)).await
    }

    /// Close both pools, flushing the WAL.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

/// SQLite URL of the memory database in `data_dir`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join(DATABASE_FILE).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, vec!["facts", "identities", "messages", "sessions"]);
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_reader_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();

        let result = sqlx::query("DELETE FROM messages")
            .execute(&pool.reader)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        DatabasePool::open(&nested).await.unwrap();
        assert!(nested.join(DATABASE_FILE).exists());
    }

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/tmp/soma"));
        assert_eq!(url, "sqlite:///tmp/soma/soma.db");
    }
}
