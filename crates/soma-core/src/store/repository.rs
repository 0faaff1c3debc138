//! Persistent store trait definitions.
//!
//! The durable store holds four independent record sets: the conversation
//! log, identity bindings, facts, and the session registry. Each concern gets
//! its own trait so components can depend only on what they touch;
//! `MemoryStore` bundles all four.
//!
//! Implementations live in soma-infra (e.g., `SqliteMemoryStore`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use soma_types::error::StorageError;
use soma_types::fact::Fact;
use soma_types::identity::{IdentityBinding, IdentityUpsert};
use soma_types::message::Message;
use soma_types::session::Session;
use soma_types::stats::{PurgeReport, StoreStats};

/// Append-only conversation log plus the session registry it maintains.
pub trait ConversationLog: Send + Sync {
    /// Append a message and upsert its session (bump `last_active_at`,
    /// increment `message_count`).
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// The `limit` most recent messages of a session, oldest first.
    fn history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StorageError>> + Send;

    /// The `limit` most recent messages across all sessions, oldest first.
    fn recent_messages(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StorageError>> + Send;

    /// Messages whose content contains `query`, newest first.
    fn search_messages(
        &self,
        query: &str,
        limit: usize,
        case_sensitive: bool,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StorageError>> + Send;

    /// Registry row for a session.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, StorageError>> + Send;
}

/// Registry of fingerprint-to-subject bindings.
pub trait IdentityRepository: Send + Sync {
    /// Insert or update a binding by fingerprint.
    ///
    /// The update path refreshes subject, confidence, notes and last-seen but
    /// never `created_at` or `source`. Last-seen never moves backwards.
    fn upsert_identity(
        &self,
        upsert: &IdentityUpsert,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    fn get_identity(
        &self,
        image_fingerprint: &str,
    ) -> impl std::future::Future<Output = Result<Option<IdentityBinding>, StorageError>> + Send;

    /// All bindings, most recently seen first.
    fn list_identities(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<IdentityBinding>, StorageError>> + Send;

    /// Record that a binding was just used.
    fn touch_identity_last_seen(
        &self,
        image_fingerprint: &str,
        seen_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// Learned facts keyed by `(category, key)`.
pub trait FactRepository: Send + Sync {
    /// Insert or update a fact. Confidence is clamped into `[0, 1]`.
    fn upsert_fact(
        &self,
        category: &str,
        key: &str,
        value: &str,
        confidence: f64,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    fn get_fact(
        &self,
        category: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Fact>, StorageError>> + Send;

    /// Facts in one category (most recently updated first), or all facts
    /// ordered by category.
    fn list_facts(
        &self,
        category: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<Fact>, StorageError>> + Send;
}

/// Retention and operator maintenance.
pub trait MaintenanceRepository: Send + Sync {
    /// Delete messages with `timestamp < horizon` and sessions with
    /// `last_active_at < horizon`, then reclaim the freed space.
    fn purge_older_than(
        &self,
        horizon: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<PurgeReport, StorageError>> + Send;

    fn stats(&self) -> impl std::future::Future<Output = Result<StoreStats, StorageError>> + Send;

    /// Delete every record in every record set.
    fn clear_all(&self) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// The complete durable store.
pub trait MemoryStore:
    ConversationLog + IdentityRepository + FactRepository + MaintenanceRepository
{
}

impl<T> MemoryStore for T where
    T: ConversationLog + IdentityRepository + FactRepository + MaintenanceRepository
{
}
