//! Explicit identity binding and resolution for the last screenshot.
//!
//! The resolver only ever answers from bindings the user asserted; it has no
//! access to image content and never guesses. All operations take the
//! session's working memory by `&mut`, so the caller must hold the session
//! lock for the whole turn.

use std::sync::Arc;

use chrono::{Local, Utc};
use soma_types::fact::{ASSERTED_IDENTITY_CONFIDENCE, IDENTITY_FACT_CATEGORY};
use soma_types::identity::{IdentityBinding, IdentityUpsert};
use soma_types::session::{SessionMemory, VisionObservation};
use tracing::{debug, info, warn};

use crate::store::repository::{FactRepository, IdentityRepository};

const NO_OBSERVATION_REPLY: &str = "I don't have a recent screenshot in working memory.";
const NO_RECALL_REPLY: &str = "I don't have a recent screenshot in working memory for this session.";
const UNKNOWN_REPLY: &str = "I don't know who the person is yet. Is that you?";

/// Fingerprints are long hex strings; logs only need a prefix.
pub(crate) fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..10).unwrap_or(fingerprint)
}

/// Result of an identity assertion.
#[derive(Debug, Clone, PartialEq)]
pub enum BindOutcome {
    Bound(IdentityBinding),
    NoObservation,
}

impl BindOutcome {
    pub fn reply(&self) -> String {
        match self {
            BindOutcome::Bound(b) if b.is_self() => {
                "Got it, I'll treat that last screenshot as you.".to_string()
            }
            BindOutcome::Bound(b) => format!(
                "Got it, I'll remember that the person in that screenshot is {}.",
                b.subject
            ),
            BindOutcome::NoObservation => NO_OBSERVATION_REPLY.to_string(),
        }
    }
}

/// Result of a "who is that" query.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Known(IdentityBinding),
    Unknown,
    NoObservation,
}

impl Resolution {
    pub fn reply(&self) -> String {
        match self {
            Resolution::Known(b) => format!(
                "Based on what you told me, the person in the screenshot is {}.",
                b.spoken_subject()
            ),
            Resolution::Unknown => UNKNOWN_REPLY.to_string(),
            Resolution::NoObservation => NO_OBSERVATION_REPLY.to_string(),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Resolution::Known(b) => Some(&b.subject),
            _ => None,
        }
    }
}

/// Describe the last observation without calling the completion backend.
pub fn recall_reply(observation: Option<&VisionObservation>) -> String {
    let Some(obs) = observation else {
        return NO_RECALL_REPLY.to_string();
    };
    let when = obs.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let window = if obs.window_title.is_empty() {
        "unknown"
    } else {
        &obs.window_title
    };
    let summary = if obs.vision_summary.is_empty() {
        "none"
    } else {
        &obs.vision_summary
    };
    format!("Last screenshot ({when}). Window: {window}. Summary: {summary}")
}

/// Binds and resolves subjects of the session's last observation.
pub struct IdentityResolver<S> {
    store: Arc<S>,
    persist: bool,
}

impl<S: IdentityRepository + FactRepository> IdentityResolver<S> {
    /// With `persist` off, bindings live only in working memory and the
    /// durable store is never consulted.
    pub fn new(store: Arc<S>, persist: bool) -> Self {
        Self { store, persist }
    }

    /// Bind the last observation to `subject`.
    pub async fn bind(&self, memory: &mut SessionMemory, subject: &str) -> BindOutcome {
        let Some(fingerprint) = memory.last_fingerprint().map(str::to_string) else {
            return BindOutcome::NoObservation;
        };

        let upsert = IdentityUpsert::asserted_by_user(fingerprint.clone(), subject);
        let mut binding = upsert.clone().into_binding();
        if let Some(previous) = memory.image_bindings.get(&fingerprint) {
            binding.created_at = previous.created_at;
            binding.source = previous.source;
        }
        memory
            .image_bindings
            .insert(fingerprint.clone(), binding.clone());
        info!(
            session_id = %memory.session_id,
            fingerprint = %short_fingerprint(&fingerprint),
            subject = %subject,
            "identity bound"
        );

        if self.persist {
            if let Err(e) = self.store.upsert_identity(&upsert).await {
                warn!(fingerprint = %short_fingerprint(&fingerprint), error = %e, "failed to persist identity");
            }
            if let Err(e) = self
                .store
                .upsert_fact(
                    IDENTITY_FACT_CATEGORY,
                    &fingerprint,
                    subject,
                    ASSERTED_IDENTITY_CONFIDENCE,
                )
                .await
            {
                warn!(fingerprint = %short_fingerprint(&fingerprint), error = %e, "failed to record identity fact");
            }
        }

        BindOutcome::Bound(binding)
    }

    /// Who is in the last observation, from working memory then the store.
    pub async fn resolve(&self, memory: &mut SessionMemory) -> Resolution {
        let Some(fingerprint) = memory.last_fingerprint().map(str::to_string) else {
            return Resolution::NoObservation;
        };

        if let Some(binding) = memory.image_bindings.get(&fingerprint) {
            debug!(fingerprint = %short_fingerprint(&fingerprint), "identity resolved from working memory");
            return Resolution::Known(binding.clone());
        }

        if !self.persist {
            return Resolution::Unknown;
        }

        match self.store.get_identity(&fingerprint).await {
            Ok(Some(mut binding)) => {
                let now = Utc::now();
                if let Err(e) = self.store.touch_identity_last_seen(&fingerprint, now).await {
                    warn!(fingerprint = %short_fingerprint(&fingerprint), error = %e, "failed to touch identity");
                } else {
                    binding.last_seen_at = binding.last_seen_at.max(now);
                }
                debug!(fingerprint = %short_fingerprint(&fingerprint), "identity resolved from store");
                memory
                    .image_bindings
                    .insert(fingerprint, binding.clone());
                Resolution::Known(binding)
            }
            Ok(None) => Resolution::Unknown,
            Err(e) => {
                warn!(fingerprint = %short_fingerprint(&fingerprint), error = %e, "identity lookup failed");
                Resolution::Unknown
            }
        }
    }
}
