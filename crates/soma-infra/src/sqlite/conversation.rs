//! Conversation log and session registry.
//!
//! Appending a message and bumping its session row happen in one writer
//! transaction, so `message_count` always matches the log.

use soma_core::store::repository::ConversationLog;
use soma_types::error::StorageError;
use soma_types::message::{Message, MessageMetadata, MessageRole};
use soma_types::session::Session;
use sqlx::Row;

use super::store::{SqliteMemoryStore, decode_err, from_millis, query_err, sql_limit, to_millis};

const MESSAGE_COLUMNS: &str = "id, session_id, timestamp, role, content, metadata";

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MessageRow {
    session_id: String,
    timestamp: i64,
    role: String,
    content: String,
    metadata: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            timestamp: row.try_get("timestamp")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            metadata: row.try_get("metadata")?,
        })
    }

    fn into_message(self) -> Result<Message, StorageError> {
        let role: MessageRole = self.role.parse().map_err(StorageError::Decode)?;
        let metadata = self
            .metadata
            .as_deref()
            .map(serde_json::from_str::<MessageMetadata>)
            .transpose()
            .map_err(|e| StorageError::Decode(format!("invalid message metadata: {e}")))?;

        Ok(Message {
            session_id: self.session_id,
            timestamp: from_millis(self.timestamp)?,
            role,
            content: self.content,
            metadata,
        })
    }
}

struct SessionRow {
    session_id: String,
    started_at: i64,
    last_active_at: i64,
    message_count: i64,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            started_at: row.try_get("started_at")?,
            last_active_at: row.try_get("last_active_at")?,
            message_count: row.try_get("message_count")?,
        })
    }

    fn into_session(self) -> Result<Session, StorageError> {
        Ok(Session {
            session_id: self.session_id,
            started_at: from_millis(self.started_at)?,
            last_active_at: from_millis(self.last_active_at)?,
            message_count: self.message_count.max(0) as u64,
        })
    }
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, StorageError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let message_row = MessageRow::from_row(row).map_err(decode_err)?;
        messages.push(message_row.into_message()?);
    }
    Ok(messages)
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// ConversationLog implementation
// ---------------------------------------------------------------------------

impl ConversationLog for SqliteMemoryStore {
    async fn append_message(&self, message: &Message) -> Result<(), StorageError> {
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Query(format!("unserializable metadata: {e}")))?;
        let ts = to_millis(&message.timestamp);

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            r#"INSERT INTO messages (session_id, timestamp, role, content, metadata)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&message.session_id)
        .bind(ts)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(metadata)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        sqlx::query(
            r#"INSERT INTO sessions (session_id, started_at, last_active_at, message_count)
               VALUES (?, ?, ?, 1)
               ON CONFLICT(session_id) DO UPDATE SET
                   last_active_at = MAX(sessions.last_active_at, excluded.last_active_at),
                   message_count = sessions.message_count + 1"#,
        )
        .bind(&message.session_id)
        .bind(ts)
        .bind(ts)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>, StorageError> {
        // newest `limit` rows, then flip so the tail of the session survives truncation
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ? \
             ORDER BY timestamp DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(session_id)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut messages = map_messages(&rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, StorageError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY timestamp DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut messages = map_messages(&rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn search_messages(
        &self,
        query: &str,
        limit: usize,
        case_sensitive: bool,
    ) -> Result<Vec<Message>, StorageError> {
        let result = if case_sensitive {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE instr(content, ?) > 0 \
                 ORDER BY timestamp DESC, id DESC LIMIT ?"
            );
            sqlx::query(&sql)
                .bind(query)
                .bind(sql_limit(limit))
                .fetch_all(&self.pool.reader)
                .await
        } else {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE content LIKE ? ESCAPE '\\' \
                 ORDER BY timestamp DESC, id DESC LIMIT ?"
            );
            sqlx::query(&sql)
                .bind(like_pattern(query))
                .bind(sql_limit(limit))
                .fetch_all(&self.pool.reader)
                .await
        };
        let rows = result.map_err(query_err)?;

        map_messages(&rows)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(decode_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }
}
