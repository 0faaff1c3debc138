//! Aggregate reports returned by the store and the context builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rows removed by a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub messages_deleted: u64,
    pub sessions_deleted: u64,
}

impl PurgeReport {
    pub fn is_empty(&self) -> bool {
        self.messages_deleted == 0 && self.sessions_deleted == 0
    }
}

/// Row counts across the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub messages: u64,
    pub sessions: u64,
    pub identities: u64,
    pub facts: u64,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_activity: Option<DateTime<Utc>>,
}

/// First and last timestamps of a message range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timespan {
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub start: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub end: Option<DateTime<Utc>>,
}

/// Token and role breakdown of a session's recent history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub estimated_tokens: usize,
    pub timespan: Timespan,
}
