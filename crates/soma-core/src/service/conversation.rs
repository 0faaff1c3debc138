//! Conversation service orchestrating text and vision turns.
//!
//! ConversationService coordinates the session cache, the identity resolver,
//! the context window builder and the completion backend, and writes every
//! turn to the durable conversation log. Memory is best-effort: storage
//! failures are logged and the turn carries on with degraded memory.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use soma_types::config::MemoryConfig;
use soma_types::error::StorageError;
use soma_types::fact::Fact;
use soma_types::identity::IdentityBinding;
use soma_types::llm::{CompletionRequest, LlmError};
use soma_types::message::{Message, MessageMetadata, MessageRole};
use soma_types::session::{SessionMemory, VisionObservation};
use soma_types::stats::{ContextStats, PurgeReport, StoreStats};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion::{CompletionBackend, complete_within};
use crate::context::{ContextBudget, ContextWindowBuilder};
use crate::identity::intent::{Intent, classify};
use crate::identity::resolver::{IdentityResolver, recall_reply, short_fingerprint};
use crate::retention::RetentionSweeper;
use crate::service::hash::ImageFingerprinter;
use crate::session::SessionMemoryCache;
use crate::store::repository::MemoryStore;

/// Prefix of server-generated session ids.
pub const TEMP_SESSION_PREFIX: &str = "temp-";

/// Errors that end a turn without a reply.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Rejected before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The completion backend failed or timed out. Not retried.
    #[error("completion backend unavailable: {0}")]
    UpstreamUnavailable(#[from] LlmError),
}

/// Reply to a text turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTurnReply {
    pub response_text: String,
    pub session_id: String,
    pub intent: &'static str,
}

/// Reply to a vision turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionTurnReply {
    pub response_text: String,
    pub image_fingerprint: String,
    pub session_id: String,
}

/// Prompt sent with every screenshot.
fn vision_prompt(window_title: &str) -> String {
    let active = if window_title.is_empty() {
        String::new()
    } else {
        format!("Active window: \"{window_title}\".")
    };
    format!(
        "You are Soma, a calm desktop co-worker.\n\
         This is a screenshot of my screen.\n\
         {active}\n\
         \n\
         Rules:\n\
         - Do NOT describe obvious UI.\n\
         - If no error is visible, say so briefly.\n\
         - Speak in ONE short sentence.\n\
         - Then give up to TWO concrete next actions.\n\
         - No hedging, no explanations."
    )
}

/// Block appended to open-ended prompts while a screenshot is remembered.
fn recent_screen_block(observation: &VisionObservation) -> String {
    format!(
        "\n\n[Recent screen]\nWindow: {}\nSummary: {}\n",
        observation.window_title, observation.vision_summary
    )
}

fn metadata(pairs: &[(&str, serde_json::Value)]) -> MessageMetadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Orchestrates turns over the session cache, identity resolver, context
/// window builder and completion backend.
///
/// Generic over the store, backend and fingerprinter so soma-core never
/// depends on soma-infra.
pub struct ConversationService<S, B, H> {
    store: Arc<S>,
    backend: Arc<B>,
    fingerprinter: Arc<H>,
    cache: SessionMemoryCache<S>,
    context: ContextWindowBuilder<S>,
    resolver: IdentityResolver<S>,
    config: MemoryConfig,
}

impl<S, B, H> ConversationService<S, B, H>
where
    S: MemoryStore + 'static,
    B: CompletionBackend,
    H: ImageFingerprinter,
{
    pub fn new(store: Arc<S>, backend: Arc<B>, fingerprinter: Arc<H>, config: MemoryConfig) -> Self {
        let features = config.features;
        Self {
            cache: SessionMemoryCache::new(
                store.clone(),
                config.session_cache_capacity,
                features.identity_persistence,
            ),
            context: ContextWindowBuilder::new(
                store.clone(),
                ContextBudget::from_config(&config),
                features.context_window,
            ),
            resolver: IdentityResolver::new(store.clone(), features.identity_persistence),
            store,
            backend,
            fingerprinter,
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn session_cache(&self) -> &SessionMemoryCache<S> {
        &self.cache
    }

    /// Use the caller's session id, or mint a temporary one.
    pub fn resolve_session_id(candidate: Option<&str>) -> String {
        match candidate.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{TEMP_SESSION_PREFIX}{}", Uuid::now_v7()),
        }
    }

    fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.config.llm.timeout_secs)
    }

    // --- Turns ---

    /// Handle a text turn.
    ///
    /// Deterministic intents (screenshot recall, identity assertion, identity
    /// query) are answered locally; everything else goes to the completion
    /// backend with the session's budgeted history.
    pub async fn submit_text_turn(
        &self,
        session_id: Option<&str>,
        text: &str,
    ) -> Result<TextTurnReply, TurnError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::InvalidInput("text must not be empty".to_string()));
        }

        let session_id = Self::resolve_session_id(session_id);
        let handle = self.cache.get(&session_id).await;
        let mut memory = handle.lock().await;

        let intent = classify(text);
        debug!(session_id = %session_id, intent = intent.label(), "text turn");

        let response_text = match &intent {
            Intent::RecallLastScreenshot => recall_reply(memory.last_vision.as_ref()),
            Intent::AssertIdentity { subject } => {
                self.resolver.bind(&mut memory, subject).await.reply()
            }
            Intent::QueryIdentity => self.resolver.resolve(&mut memory).await.reply(),
            Intent::Open => return self.open_turn(&memory, &session_id, text).await,
        };

        let tag = metadata(&[("intent", json!(intent.label()))]);
        self.log(Message::now(&session_id, MessageRole::User, text).with_metadata(tag.clone()))
            .await;
        self.log(
            Message::now(&session_id, MessageRole::Assistant, response_text.clone())
                .with_metadata(tag),
        )
        .await;

        Ok(TextTurnReply {
            response_text,
            session_id,
            intent: intent.label(),
        })
    }

    async fn open_turn(
        &self,
        memory: &SessionMemory,
        session_id: &str,
        text: &str,
    ) -> Result<TextTurnReply, TurnError> {
        let mut current = text.to_string();
        if let Some(obs) = &memory.last_vision {
            current.push_str(&recent_screen_block(obs));
        }
        // history is read before this turn is logged so it never repeats itself
        let prompt = self.context.format_for_prompt(session_id, &current).await;

        self.log(
            Message::now(session_id, MessageRole::User, text)
                .with_metadata(metadata(&[("intent", json!(Intent::Open.label()))])),
        )
        .await;

        let request = CompletionRequest::chat(prompt);
        let response = complete_within(self.backend.as_ref(), &request, self.completion_timeout())
            .await
            .inspect_err(|e| warn!(session_id = %session_id, error = %e, "chat completion failed"))?;
        let response_text = response.content.trim().to_string();

        self.log(
            Message::now(session_id, MessageRole::Assistant, response_text.clone()).with_metadata(
                metadata(&[
                    ("intent", json!(Intent::Open.label())),
                    ("model", json!(response.model)),
                ]),
            ),
        )
        .await;

        Ok(TextTurnReply {
            response_text,
            session_id: session_id.to_string(),
            intent: Intent::Open.label(),
        })
    }

    /// Handle a screenshot.
    ///
    /// The image is fingerprinted and described by the vision model; on
    /// success it becomes the session's last observation and is logged as an
    /// observation row plus a summary row.
    pub async fn submit_vision_turn(
        &self,
        session_id: Option<&str>,
        image: &[u8],
        window_title: &str,
    ) -> Result<VisionTurnReply, TurnError> {
        if image.is_empty() {
            return Err(TurnError::InvalidInput("image must not be empty".to_string()));
        }

        let session_id = Self::resolve_session_id(session_id);
        let window_title = window_title.trim().to_string();
        let fingerprint = self.fingerprinter.fingerprint(image);

        let handle = self.cache.get(&session_id).await;
        let mut memory = handle.lock().await;

        let mut request = CompletionRequest::vision(vision_prompt(&window_title), image.to_vec());
        request.max_tokens = Some(self.config.llm.vision_max_tokens);
        request.temperature = Some(self.config.llm.vision_temperature);
        let response = complete_within(self.backend.as_ref(), &request, self.completion_timeout())
            .await
            .inspect_err(|e| warn!(session_id = %session_id, error = %e, "vision completion failed"))?;
        let summary = response.content.trim().to_string();

        let observation = VisionObservation {
            image_fingerprint: fingerprint.clone(),
            window_title: window_title.clone(),
            vision_summary: summary.clone(),
            timestamp: Utc::now(),
        };
        memory.last_vision = Some(observation);
        let shown_title = if window_title.is_empty() {
            "no-title"
        } else {
            window_title.as_str()
        };
        info!(
            session_id = %session_id,
            fingerprint = %short_fingerprint(&fingerprint),
            window_title = %shown_title,
            "last vision set"
        );

        self.log(
            Message::now(
                &session_id,
                MessageRole::User,
                format!("[Screenshot] Window: {window_title}"),
            )
            .with_metadata(metadata(&[
                ("kind", json!("vision_observation")),
                ("image_fingerprint", json!(fingerprint)),
                ("window_title", json!(window_title)),
            ])),
        )
        .await;
        self.log(
            Message::now(&session_id, MessageRole::Assistant, summary.clone()).with_metadata(
                metadata(&[
                    ("kind", json!("vision_summary")),
                    ("image_fingerprint", json!(fingerprint)),
                    ("model", json!(response.model)),
                ]),
            ),
        )
        .await;

        Ok(VisionTurnReply {
            response_text: summary,
            image_fingerprint: fingerprint,
            session_id,
        })
    }

    async fn log(&self, message: Message) {
        if !self.config.features.long_term_logging {
            return;
        }
        if let Err(e) = self.store.append_message(&message).await {
            warn!(
                session_id = %message.session_id,
                role = %message.role,
                error = %e,
                "failed to log message"
            );
        }
    }

    // --- Queries ---

    /// The `limit` most recent messages of a session, oldest first.
    pub async fn get_history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        self.store.history(session_id, limit).await
    }

    pub async fn get_context_stats(&self, session_id: &str) -> Result<ContextStats, StorageError> {
        self.context.context_stats(session_id).await
    }

    pub async fn should_prune(&self, session_id: &str) -> Result<bool, StorageError> {
        self.context.should_prune(session_id).await
    }

    /// All durable identity bindings, most recently seen first.
    pub async fn get_all_identities(&self) -> Result<Vec<IdentityBinding>, StorageError> {
        self.store.list_identities().await
    }

    pub async fn list_facts(&self, category: Option<&str>) -> Result<Vec<Fact>, StorageError> {
        self.store.list_facts(category).await
    }

    /// Messages containing `query`, newest first.
    pub async fn search_messages(
        &self,
        query: &str,
        limit: usize,
        case_sensitive: bool,
    ) -> Result<Vec<Message>, StorageError> {
        self.store.search_messages(query, limit, case_sensitive).await
    }

    /// The `limit` most recent messages across all sessions, oldest first.
    pub async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>, StorageError> {
        self.store.recent_messages(limit).await
    }

    pub async fn store_stats(&self) -> Result<StoreStats, StorageError> {
        self.store.stats().await
    }

    // --- Maintenance ---

    /// The background sweeper for this service's store and retention policy.
    pub fn retention_sweeper(&self) -> RetentionSweeper<S> {
        RetentionSweeper::new(
            self.store.clone(),
            self.config.retention_days,
            &self.config.retention,
        )
    }

    /// Purge now, optionally with a different retention period.
    pub async fn cleanup(&self, retention_days: Option<u32>) -> Result<PurgeReport, StorageError> {
        let days = retention_days.unwrap_or(self.config.retention_days);
        RetentionSweeper::new(self.store.clone(), days, &self.config.retention)
            .run_once()
            .await
    }

    /// Purge everything older than `horizon`.
    pub async fn purge_older_than(
        &self,
        horizon: DateTime<Utc>,
    ) -> Result<PurgeReport, StorageError> {
        self.store.purge_older_than(horizon).await
    }

    /// Delete all durable memory. Working memory of live sessions is kept.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.store.clear_all().await?;
        warn!("all durable memory cleared");
        Ok(())
    }
}
