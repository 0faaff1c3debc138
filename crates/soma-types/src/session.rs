//! Session registry and working-memory types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityBinding;

/// Durable per-session bookkeeping row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_active_at: DateTime<Utc>,
    pub message_count: u64,
}

/// The most recent screenshot seen in a session.
///
/// Produced by a vision turn; never stored as its own entity, only projected
/// into working memory and logged as two conversation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionObservation {
    pub image_fingerprint: String,
    pub window_title: String,
    pub vision_summary: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Ephemeral, process-lifetime state for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    pub session_id: String,
    pub last_vision: Option<VisionObservation>,
    /// Provisional bindings keyed by image fingerprint.
    pub image_bindings: HashMap<String, IdentityBinding>,
}

impl SessionMemory {
    /// A blank memory with no observation and no bindings.
    pub fn blank(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            last_vision: None,
            image_bindings: HashMap::new(),
        }
    }

    /// Fingerprint of the last observation, if any.
    pub fn last_fingerprint(&self) -> Option<&str> {
        self.last_vision
            .as_ref()
            .map(|v| v.image_fingerprint.as_str())
    }
}
