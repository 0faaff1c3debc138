//! Identity bindings keyed by image fingerprint.

use chrono::{DateTime, Utc};
use soma_core::store::repository::IdentityRepository;
use soma_types::error::StorageError;
use soma_types::identity::{BindingSource, Confidence, IdentityBinding, IdentityUpsert};
use sqlx::Row;

use super::store::{SqliteMemoryStore, decode_err, from_millis, query_err, to_millis};

struct IdentityRow {
    image_fingerprint: String,
    subject: String,
    confidence: String,
    source: String,
    created_at: i64,
    last_seen_at: i64,
    notes: Option<String>,
}

impl IdentityRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            image_fingerprint: row.try_get("image_fingerprint")?,
            subject: row.try_get("subject")?,
            confidence: row.try_get("confidence")?,
            source: row.try_get("source")?,
            created_at: row.try_get("created_at")?,
            last_seen_at: row.try_get("last_seen_at")?,
            notes: row.try_get("notes")?,
        })
    }

    fn into_binding(self) -> Result<IdentityBinding, StorageError> {
        let confidence: Confidence = self.confidence.parse().map_err(StorageError::Decode)?;
        let source: BindingSource = self.source.parse().map_err(StorageError::Decode)?;

        Ok(IdentityBinding {
            image_fingerprint: self.image_fingerprint,
            subject: self.subject,
            confidence,
            source,
            created_at: from_millis(self.created_at)?,
            last_seen_at: from_millis(self.last_seen_at)?,
            notes: self.notes,
        })
    }
}

impl IdentityRepository for SqliteMemoryStore {
    async fn upsert_identity(&self, upsert: &IdentityUpsert) -> Result<(), StorageError> {
        let seen = to_millis(&upsert.seen_at);

        // created_at and source are only written by the INSERT path
        sqlx::query(
            r#"INSERT INTO identities
                   (image_fingerprint, subject, confidence, source, created_at, last_seen_at, notes)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(image_fingerprint) DO UPDATE SET
                   subject = excluded.subject,
                   confidence = excluded.confidence,
                   last_seen_at = MAX(identities.last_seen_at, excluded.last_seen_at),
                   notes = excluded.notes"#,
        )
        .bind(&upsert.image_fingerprint)
        .bind(&upsert.subject)
        .bind(upsert.confidence.to_string())
        .bind(upsert.source.to_string())
        .bind(seen)
        .bind(seen)
        .bind(&upsert.notes)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        tracing::debug!(
            fingerprint = %upsert.image_fingerprint.get(..10).unwrap_or(&upsert.image_fingerprint),
            subject = %upsert.subject,
            "identity saved"
        );
        Ok(())
    }

    async fn get_identity(
        &self,
        image_fingerprint: &str,
    ) -> Result<Option<IdentityBinding>, StorageError> {
        let row = sqlx::query("SELECT * FROM identities WHERE image_fingerprint = ?")
            .bind(image_fingerprint)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let identity_row = IdentityRow::from_row(&row).map_err(decode_err)?;
                Ok(Some(identity_row.into_binding()?))
            }
            None => Ok(None),
        }
    }

    async fn list_identities(&self) -> Result<Vec<IdentityBinding>, StorageError> {
        let rows = sqlx::query("SELECT * FROM identities ORDER BY last_seen_at DESC, id DESC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut bindings = Vec::with_capacity(rows.len());
        for row in &rows {
            let identity_row = IdentityRow::from_row(row).map_err(decode_err)?;
            bindings.push(identity_row.into_binding()?);
        }
        Ok(bindings)
    }

    async fn touch_identity_last_seen(
        &self,
        image_fingerprint: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE identities SET last_seen_at = MAX(last_seen_at, ?) WHERE image_fingerprint = ?",
        )
        .bind(to_millis(&seen_at))
        .bind(image_fingerprint)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::test_support::temp_store;
    use chrono::Duration;

    fn upsert(fp: &str, subject: &str, seen_at: DateTime<Utc>) -> IdentityUpsert {
        IdentityUpsert {
            seen_at,
            ..IdentityUpsert::asserted_by_user(fp, subject)
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let (store, _dir) = temp_store().await;
        assert!(store.get_identity("h1").await.unwrap().is_none());

        store
            .upsert_identity(&IdentityUpsert::asserted_by_user("h1", "user"))
            .await
            .unwrap();
        let binding = store.get_identity("h1").await.unwrap().unwrap();
        assert_eq!(binding.subject, "user");
        assert_eq!(binding.confidence, Confidence::High);
        assert_eq!(binding.source, BindingSource::User);
        assert!(binding.notes.is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_last_seen_monotonic() {
        let (store, _dir) = temp_store().await;
        let t0 = Utc::now();
        store.upsert_identity(&upsert("h1", "Alice", t0)).await.unwrap();
        let first = store.get_identity("h1").await.unwrap().unwrap();

        store.upsert_identity(&upsert("h1", "Alice", t0)).await.unwrap();
        let second = store.get_identity("h1").await.unwrap().unwrap();
        assert_eq!(first, second);

        // an older upsert must not pull last_seen backwards
        store
            .upsert_identity(&upsert("h1", "Alice", t0 - Duration::hours(1)))
            .await
            .unwrap();
        let third = store.get_identity("h1").await.unwrap().unwrap();
        assert_eq!(third.last_seen_at, first.last_seen_at);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_source() {
        let (store, _dir) = temp_store().await;
        let t0 = Utc::now() - Duration::days(1);
        let system = IdentityUpsert {
            source: BindingSource::System,
            confidence: Confidence::Low,
            ..upsert("h1", "Alice", t0)
        };
        store.upsert_identity(&system).await.unwrap();

        let mut update = upsert("h1", "Bob", Utc::now());
        update.notes = Some("corrected".to_string());
        store.upsert_identity(&update).await.unwrap();

        let binding = store.get_identity("h1").await.unwrap().unwrap();
        assert_eq!(binding.subject, "Bob");
        assert_eq!(binding.confidence, Confidence::High);
        assert_eq!(binding.source, BindingSource::System);
        assert_eq!(binding.created_at.timestamp_millis(), t0.timestamp_millis());
        assert_eq!(binding.notes.as_deref(), Some("corrected"));
        assert!(binding.last_seen_at > binding.created_at);
    }

    #[tokio::test]
    async fn test_touch_and_list_order() {
        let (store, _dir) = temp_store().await;
        let t0 = Utc::now() - Duration::hours(2);
        store.upsert_identity(&upsert("h1", "Alice", t0)).await.unwrap();
        store
            .upsert_identity(&upsert("h2", "Bob", t0 + Duration::minutes(1)))
            .await
            .unwrap();

        let listed = store.list_identities().await.unwrap();
        assert_eq!(listed[0].image_fingerprint, "h2");

        store.touch_identity_last_seen("h1", Utc::now()).await.unwrap();
        let listed = store.list_identities().await.unwrap();
        assert_eq!(listed[0].image_fingerprint, "h1");

        // touching with an older time is a no-op
        let before = store.get_identity("h1").await.unwrap().unwrap().last_seen_at;
        store.touch_identity_last_seen("h1", t0).await.unwrap();
        let after = store.get_identity("h1").await.unwrap().unwrap().last_seen_at;
        assert_eq!(before, after);

        // unknown fingerprints are ignored
        store.touch_identity_last_seen("missing", Utc::now()).await.unwrap();
        assert!(store.get_identity("missing").await.unwrap().is_none());
    }
}
