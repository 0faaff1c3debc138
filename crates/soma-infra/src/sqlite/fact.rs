//! Learned facts keyed by `(category, key)`.

use chrono::Utc;
use soma_core::store::repository::FactRepository;
use soma_types::error::StorageError;
use soma_types::fact::{Fact, clamp_confidence};
use sqlx::Row;

use super::store::{SqliteMemoryStore, decode_err, from_millis, query_err, to_millis};

struct FactRow {
    category: String,
    fact_key: String,
    fact_value: String,
    confidence: f64,
    created_at: i64,
    updated_at: i64,
}

impl FactRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            category: row.try_get("category")?,
            fact_key: row.try_get("fact_key")?,
            fact_value: row.try_get("fact_value")?,
            confidence: row.try_get("confidence")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_fact(self) -> Result<Fact, StorageError> {
        Ok(Fact {
            category: self.category,
            key: self.fact_key,
            value: self.fact_value,
            confidence: self.confidence,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

impl FactRepository for SqliteMemoryStore {
    async fn upsert_fact(
        &self,
        category: &str,
        key: &str,
        value: &str,
        confidence: f64,
    ) -> Result<(), StorageError> {
        let now = to_millis(&Utc::now());

        sqlx::query(
            r#"INSERT INTO facts (category, fact_key, fact_value, confidence, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(category, fact_key) DO UPDATE SET
                   fact_value = excluded.fact_value,
                   confidence = excluded.confidence,
                   updated_at = excluded.updated_at"#,
        )
        .bind(category)
        .bind(key)
        .bind(value)
        .bind(clamp_confidence(confidence))
        .bind(now)
        .bind(now)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_fact(&self, category: &str, key: &str) -> Result<Option<Fact>, StorageError> {
        let row = sqlx::query("SELECT * FROM facts WHERE category = ? AND fact_key = ?")
            .bind(category)
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let fact_row = FactRow::from_row(&row).map_err(decode_err)?;
                Ok(Some(fact_row.into_fact()?))
            }
            None => Ok(None),
        }
    }

    async fn list_facts(&self, category: Option<&str>) -> Result<Vec<Fact>, StorageError> {
        let rows = match category {
            Some(category) => {
                sqlx::query("SELECT * FROM facts WHERE category = ? ORDER BY updated_at DESC, id DESC")
                    .bind(category)
                    .fetch_all(&self.pool.reader)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM facts ORDER BY category, updated_at DESC")
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(query_err)?;

        let mut facts = Vec::with_capacity(rows.len());
        for row in &rows {
            let fact_row = FactRow::from_row(row).map_err(decode_err)?;
            facts.push(fact_row.into_fact()?);
        }
        Ok(facts)
    }
}
