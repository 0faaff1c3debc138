//! In-memory `MemoryStore` used by core unit tests.
//!
//! Mirrors the SQLite semantics closely enough for logic tests: ordering by
//! timestamp then insertion, last-seen kept monotonic, strict `<` purges.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use soma_types::error::StorageError;
use soma_types::fact::{Fact, clamp_confidence};
use soma_types::identity::{IdentityBinding, IdentityUpsert};
use soma_types::message::Message;
use soma_types::session::Session;
use soma_types::stats::{PurgeReport, StoreStats};

use super::repository::{
    ConversationLog, FactRepository, IdentityRepository, MaintenanceRepository,
};

#[derive(Default)]
struct Inner {
    /// (row id, message)
    messages: Vec<(u64, Message)>,
    next_row: u64,
    sessions: BTreeMap<String, Session>,
    identities: BTreeMap<String, IdentityBinding>,
    facts: BTreeMap<(String, String), Fact>,
}

#[derive(Default)]
pub(crate) struct InMemoryStore {
    inner: Mutex<Inner>,
    fail: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a query error.
    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of read calls served so far.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StorageError::Query("simulated failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<(), StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn sorted_desc(messages: impl Iterator<Item = (u64, Message)>) -> Vec<Message> {
        let mut rows: Vec<(u64, Message)> = messages.collect();
        rows.sort_by(|a, b| (b.1.timestamp, b.0).cmp(&(a.1.timestamp, a.0)));
        rows.into_iter().map(|(_, m)| m).collect()
    }
}

impl ConversationLog for InMemoryStore {
    async fn append_message(&self, message: &Message) -> Result<(), StorageError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let row = inner.next_row;
        inner.next_row += 1;
        inner.messages.push((row, message.clone()));
        inner
            .sessions
            .entry(message.session_id.clone())
            .and_modify(|s| {
                s.last_active_at = message.timestamp;
                s.message_count += 1;
            })
            .or_insert_with(|| Session {
                session_id: message.session_id.clone(),
                started_at: message.timestamp,
                last_active_at: message.timestamp,
                message_count: 1,
            });
        Ok(())
    }

    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>, StorageError> {
        self.read()?;
        let inner = self.inner.lock().unwrap();
        let rows = inner
            .messages
            .iter()
            .filter(|(_, m)| m.session_id == session_id)
            .cloned();
        let mut newest: Vec<Message> = Self::sorted_desc(rows).into_iter().take(limit).collect();
        newest.reverse();
        Ok(newest)
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, StorageError> {
        self.read()?;
        let inner = self.inner.lock().unwrap();
        let mut newest: Vec<Message> = Self::sorted_desc(inner.messages.iter().cloned())
            .into_iter()
            .take(limit)
            .collect();
        newest.reverse();
        Ok(newest)
    }

    async fn search_messages(
        &self,
        query: &str,
        limit: usize,
        case_sensitive: bool,
    ) -> Result<Vec<Message>, StorageError> {
        self.read()?;
        let inner = self.inner.lock().unwrap();
        let needle = if case_sensitive {
            query.to_string()
        } else {
            query.to_lowercase()
        };
        let rows = inner.messages.iter().filter(|(_, m)| {
            if case_sensitive {
                m.content.contains(&needle)
            } else {
                m.content.to_lowercase().contains(&needle)
            }
        });
        Ok(Self::sorted_desc(rows.cloned()).into_iter().take(limit).collect())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        self.read()?;
        Ok(self.inner.lock().unwrap().sessions.get(session_id).cloned())
    }
}

impl IdentityRepository for InMemoryStore {
    async fn upsert_identity(&self, upsert: &IdentityUpsert) -> Result<(), StorageError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        match inner.identities.get_mut(&upsert.image_fingerprint) {
            Some(existing) => {
                existing.subject = upsert.subject.clone();
                existing.confidence = upsert.confidence;
                existing.notes = upsert.notes.clone();
                existing.last_seen_at = existing.last_seen_at.max(upsert.seen_at);
            }
            None => {
                inner
                    .identities
                    .insert(upsert.image_fingerprint.clone(), upsert.clone().into_binding());
            }
        }
        Ok(())
    }

    async fn get_identity(
        &self,
        image_fingerprint: &str,
    ) -> Result<Option<IdentityBinding>, StorageError> {
        self.read()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .identities
            .get(image_fingerprint)
            .cloned())
    }

    async fn list_identities(&self) -> Result<Vec<IdentityBinding>, StorageError> {
        self.read()?;
        let mut all: Vec<IdentityBinding> =
            self.inner.lock().unwrap().identities.values().cloned().collect();
        all.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        Ok(all)
    }

    async fn touch_identity_last_seen(
        &self,
        image_fingerprint: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.check()?;
        if let Some(b) = self
            .inner
            .lock()
            .unwrap()
            .identities
            .get_mut(image_fingerprint)
        {
            b.last_seen_at = b.last_seen_at.max(seen_at);
        }
        Ok(())
    }
}

impl FactRepository for InMemoryStore {
    async fn upsert_fact(
        &self,
        category: &str,
        key: &str,
        value: &str,
        confidence: f64,
    ) -> Result<(), StorageError> {
        self.check()?;
        let now = Utc::now();
        let confidence = clamp_confidence(confidence);
        let mut inner = self.inner.lock().unwrap();
        inner
            .facts
            .entry((category.to_string(), key.to_string()))
            .and_modify(|f| {
                f.value = value.to_string();
                f.confidence = confidence;
                f.updated_at = now;
            })
            .or_insert_with(|| Fact {
                category: category.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                confidence,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn get_fact(&self, category: &str, key: &str) -> Result<Option<Fact>, StorageError> {
        self.read()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .facts
            .get(&(category.to_string(), key.to_string()))
            .cloned())
    }

    async fn list_facts(&self, category: Option<&str>) -> Result<Vec<Fact>, StorageError> {
        self.read()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .facts
            .values()
            .filter(|f| category.is_none_or(|c| f.category == c))
            .cloned()
            .collect())
    }
}

impl MaintenanceRepository for InMemoryStore {
    async fn purge_older_than(&self, horizon: DateTime<Utc>) -> Result<PurgeReport, StorageError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let before_messages = inner.messages.len();
        inner.messages.retain(|(_, m)| m.timestamp >= horizon);
        let before_sessions = inner.sessions.len();
        inner.sessions.retain(|_, s| s.last_active_at >= horizon);
        Ok(PurgeReport {
            messages_deleted: (before_messages - inner.messages.len()) as u64,
            sessions_deleted: (before_sessions - inner.sessions.len()) as u64,
        })
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        self.read()?;
        let inner = self.inner.lock().unwrap();
        Ok(StoreStats {
            messages: inner.messages.len() as u64,
            sessions: inner.sessions.len() as u64,
            identities: inner.identities.len() as u64,
            facts: inner.facts.len() as u64,
            last_activity: inner.messages.iter().map(|(_, m)| m.timestamp).max(),
        })
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::default();
        Ok(())
    }
}
