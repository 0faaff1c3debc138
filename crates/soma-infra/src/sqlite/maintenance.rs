//! Retention purge, aggregate stats, and full wipe.

use chrono::{DateTime, Utc};
use soma_core::store::repository::MaintenanceRepository;
use soma_types::error::StorageError;
use soma_types::stats::{PurgeReport, StoreStats};
use sqlx::Row;

use super::store::{SqliteMemoryStore, decode_err, from_millis, query_err, to_millis};

impl SqliteMemoryStore {
    /// Rebuild the database file and truncate the WAL.
    async fn compact(&self) -> Result<(), StorageError> {
        sqlx::query("VACUUM")
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(())
    }
}

fn count(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<u64, StorageError> {
    let n: i64 = row.try_get(column).map_err(decode_err)?;
    Ok(n.max(0) as u64)
}

impl MaintenanceRepository for SqliteMemoryStore {
    async fn purge_older_than(&self, horizon: DateTime<Utc>) -> Result<PurgeReport, StorageError> {
        let cutoff = to_millis(&horizon);
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let messages = sqlx::query("DELETE FROM messages WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        let sessions = sqlx::query("DELETE FROM sessions WHERE last_active_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        let report = PurgeReport {
            messages_deleted: messages.rows_affected(),
            sessions_deleted: sessions.rows_affected(),
        };

        // VACUUM cannot run inside a transaction
        if !report.is_empty() {
            self.compact().await?;
        }

        tracing::debug!(
            messages = report.messages_deleted,
            sessions = report.sessions_deleted,
            "purged expired rows"
        );
        Ok(report)
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let row = sqlx::query(
            r#"SELECT
                   (SELECT COUNT(*) FROM messages) AS messages,
                   (SELECT COUNT(*) FROM sessions) AS sessions,
                   (SELECT COUNT(*) FROM identities) AS identities,
                   (SELECT COUNT(*) FROM facts) AS facts,
                   (SELECT MAX(timestamp) FROM messages) AS last_activity"#,
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let last_activity: Option<i64> = row.try_get("last_activity").map_err(decode_err)?;

        Ok(StoreStats {
            messages: count(&row, "messages")?,
            sessions: count(&row, "sessions")?,
            identities: count(&row, "identities")?,
            facts: count(&row, "facts")?,
            last_activity: last_activity.map(from_millis).transpose()?,
        })
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        for table in ["messages", "sessions", "identities", "facts"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;
        }
        tx.commit().await.map_err(query_err)?;

        self.compact().await?;
        tracing::info!("memory store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::test_support::temp_store;
    use chrono::Duration;
    use soma_core::store::repository::{ConversationLog, FactRepository, IdentityRepository};
    use soma_types::identity::IdentityUpsert;
    use soma_types::message::{Message, MessageRole};

    async fn seed_aged(store: &SqliteMemoryStore, now: DateTime<Utc>) {
        let old = Message::now("old", MessageRole::User, "stale").at(now - Duration::days(45));
        let fresh = Message::now("fresh", MessageRole::User, "recent").at(now - Duration::days(10));
        store.append_message(&old).await.unwrap();
        store.append_message(&fresh).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_rows_inside_retention() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();
        seed_aged(&store, now).await;

        let report = store.purge_older_than(now - Duration::days(30)).await.unwrap();
        assert_eq!(report.messages_deleted, 1);
        assert_eq!(report.sessions_deleted, 1);

        let remaining = store.recent_messages(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "recent");
        assert!(store.get_session("old").await.unwrap().is_none());
        assert!(store.get_session("fresh").await.unwrap().is_some());

        // second run at the same horizon is a no-op
        let again = store.purge_older_than(now - Duration::days(30)).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_purge_leaves_identities_and_facts() {
        let (store, _dir) = temp_store().await;
        let now = Utc::now();
        let mut upsert = IdentityUpsert::asserted_by_user("h1", "user");
        upsert.seen_at = now - Duration::days(90);
        store.upsert_identity(&upsert).await.unwrap();
        store.upsert_fact("identity", "h1", "user", 0.95).await.unwrap();

        store.purge_older_than(now - Duration::days(30)).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.identities, 1);
        assert_eq!(stats.facts, 1);
    }

    #[tokio::test]
    async fn test_stats_and_clear_all() {
        let (store, _dir) = temp_store().await;
        let empty = store.stats().await.unwrap();
        assert_eq!(empty, StoreStats::default());

        let now = Utc::now();
        seed_aged(&store, now).await;
        store
            .upsert_identity(&IdentityUpsert::asserted_by_user("h1", "user"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.identities, 1);
        assert_eq!(stats.facts, 0);
        assert_eq!(
            stats.last_activity.unwrap().timestamp_millis(),
            (now - Duration::days(10)).timestamp_millis()
        );

        store.clear_all().await.unwrap();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }
}
