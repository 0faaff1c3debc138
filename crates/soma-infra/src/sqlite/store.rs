//! SQLite-backed memory store.
//!
//! `SqliteMemoryStore` implements every store trait from `soma-core`
//! (`ConversationLog`, `IdentityRepository`, `FactRepository`,
//! `MaintenanceRepository`); the impls are split across sibling modules by
//! record set. Timestamps are stored as INTEGER milliseconds since the epoch.

use chrono::{DateTime, Utc};
use soma_types::error::StorageError;

use super::pool::DatabasePool;

/// SQLite implementation of the full `MemoryStore`.
#[derive(Clone)]
pub struct SqliteMemoryStore {
    pub(super) pool: DatabasePool,
}

impl SqliteMemoryStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the record-set modules
// ---------------------------------------------------------------------------

pub(super) fn to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

pub(super) fn from_millis(ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::Decode(format!("timestamp out of range: {ms}")))
}

/// Clamp a `usize` limit into SQLite's signed LIMIT range.
pub(super) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub(super) fn query_err(e: sqlx::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

pub(super) fn decode_err(e: sqlx::Error) -> StorageError {
    StorageError::Decode(e.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A store over a throwaway database. Keep the `TempDir` alive.
    pub(crate) async fn temp_store() -> (SqliteMemoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        (SqliteMemoryStore::new(pool), dir)
    }
}
