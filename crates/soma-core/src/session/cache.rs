//! Bounded working-memory cache keyed by session id.
//!
//! Each session's `SessionMemory` lives behind its own `tokio::sync::Mutex`;
//! callers lock it for the length of a turn so turns within one session are
//! serialized while different sessions proceed in parallel. The map itself is
//! a `DashMap`, and no map guard is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use soma_types::identity::IdentityBinding;
use soma_types::session::SessionMemory;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::repository::IdentityRepository;

/// Shared handle to one session's working memory.
pub type SessionHandle = Arc<Mutex<SessionMemory>>;

struct CacheEntry {
    handle: SessionHandle,
    last_access: AtomicU64,
}

/// Lookup-or-create cache with least-recently-accessed eviction.
pub struct SessionMemoryCache<S> {
    store: Arc<S>,
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    clock: AtomicU64,
    warm_from_store: bool,
}

impl<S: IdentityRepository> SessionMemoryCache<S> {
    /// `warm_from_store` controls whether new sessions copy the durable
    /// identity bindings into their working memory.
    pub fn new(store: Arc<S>, capacity: usize, warm_from_store: bool) -> Self {
        Self {
            store,
            entries: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            warm_from_store,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Handle to the session's memory, creating it on first use.
    pub async fn get(&self, session_id: &str) -> SessionHandle {
        if let Some(entry) = self.entries.get(session_id) {
            entry.last_access.store(self.tick(), Ordering::Relaxed);
            return entry.handle.clone();
        }

        let bindings = self.warm_bindings(session_id).await;

        let now = self.tick();
        let handle = {
            let entry = self
                .entries
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    let mut memory = SessionMemory::blank(session_id);
                    memory.image_bindings = bindings;
                    CacheEntry {
                        handle: Arc::new(Mutex::new(memory)),
                        last_access: AtomicU64::new(now),
                    }
                });
            entry.last_access.store(now, Ordering::Relaxed);
            entry.handle.clone()
        };

        self.evict_over_capacity(session_id);
        handle
    }

    /// Handle to an already cached session without creating or touching it.
    pub fn peek(&self, session_id: &str) -> Option<SessionHandle> {
        self.entries.get(session_id).map(|e| e.handle.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    async fn warm_bindings(&self, session_id: &str) -> HashMap<String, IdentityBinding> {
        if !self.warm_from_store {
            return HashMap::new();
        }
        match self.store.list_identities().await {
            Ok(bindings) => {
                debug!(
                    session_id = %session_id,
                    bindings = bindings.len(),
                    "session memory warmed"
                );
                bindings
                    .into_iter()
                    .map(|b| (b.image_fingerprint.clone(), b))
                    .collect()
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "identity warm-up failed");
                HashMap::new()
            }
        }
    }

    /// Sessions that are held by a caller or locked mid-turn are never
    /// evicted; the cache may briefly exceed capacity while all of them are
    /// busy.
    fn evict_over_capacity(&self, keep: &str) {
        while self.entries.len() > self.capacity {
            // find the victim first; removing while iterating would deadlock
            let victim = self
                .entries
                .iter()
                .filter(|e| e.key() != keep && is_idle(&e.value().handle))
                .min_by_key(|e| e.value().last_access.load(Ordering::Relaxed))
                .map(|e| e.key().clone());
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                    debug!(session_id = %key, "session memory evicted");
                }
                None => break,
            }
        }
    }
}

/// No caller holds the handle and nobody is inside a turn.
fn is_idle(handle: &SessionHandle) -> bool {
    Arc::strong_count(handle) == 1 && handle.try_lock().is_ok()
}
