//! Budgeted conversation context for open-ended prompts.
//!
//! The window walks history from newest to oldest, accepting messages until
//! either the message budget or the token budget is reached. The newest
//! message is always included even if it alone exceeds the token budget.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Local;
use soma_types::error::StorageError;
use soma_types::message::{Message, MessageRole};
use soma_types::stats::{ContextStats, Timespan};
use tracing::{debug, warn};

use super::budget::{ContextBudget, STATS_SAMPLE_SIZE};
use crate::store::repository::ConversationLog;

/// A chronological slice of history that fits the budget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextWindow {
    pub messages: Vec<Message>,
    pub total_tokens: usize,
    pub message_count: usize,
}

impl ContextWindow {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Select the window from `history` (chronological order).
pub fn select_window(history: &[Message], budget: &ContextBudget) -> ContextWindow {
    if budget.max_messages == 0 {
        return ContextWindow::default();
    }

    let mut accepted: Vec<Message> = Vec::new();
    let mut total_tokens = 0usize;

    for msg in history.iter().rev() {
        let cost = budget.estimate(&msg.content);
        if total_tokens + cost > budget.max_tokens && !accepted.is_empty() {
            break;
        }
        accepted.push(msg.clone());
        total_tokens += cost;
        if accepted.len() >= budget.max_messages {
            break;
        }
    }

    accepted.reverse();
    let message_count = accepted.len();
    ContextWindow {
        messages: accepted,
        total_tokens,
        message_count,
    }
}

/// Render a window and the current prompt into a single completion prompt.
///
/// An empty window yields the prompt unchanged.
pub fn render_prompt(window: &ContextWindow, prompt: &str) -> String {
    if window.is_empty() {
        return prompt.to_string();
    }

    let mut out = String::from("\n\n[Conversation History]\n");
    for msg in &window.messages {
        let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let speaker = match msg.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "You",
        };
        let _ = writeln!(out, "[{time}] {speaker}: {}", msg.content);
    }
    let _ = write!(out, "\n[Current Message]\nUser: {prompt}\n");
    out
}

/// Summarize a run of messages for stats reporting.
pub fn summarize(history: &[Message], budget: &ContextBudget) -> ContextStats {
    let mut stats = ContextStats {
        total_messages: history.len(),
        timespan: Timespan {
            start: history.first().map(|m| m.timestamp),
            end: history.last().map(|m| m.timestamp),
        },
        ..Default::default()
    };
    for msg in history {
        stats.estimated_tokens += budget.estimate(&msg.content);
        match msg.role {
            MessageRole::User => stats.user_messages += 1,
            MessageRole::Assistant => stats.assistant_messages += 1,
        }
    }
    stats
}

/// Builds context windows from the durable conversation log.
pub struct ContextWindowBuilder<S> {
    store: Arc<S>,
    budget: ContextBudget,
    enabled: bool,
}

impl<S: ConversationLog> ContextWindowBuilder<S> {
    pub fn new(store: Arc<S>, budget: ContextBudget, enabled: bool) -> Self {
        Self {
            store,
            budget,
            enabled,
        }
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Select the budgeted window for a session.
    pub async fn build(&self, session_id: &str) -> Result<ContextWindow, StorageError> {
        let history = self
            .store
            .history(session_id, self.budget.fetch_limit())
            .await?;
        let window = select_window(&history, &self.budget);
        debug!(
            session_id = %session_id,
            fetched = history.len(),
            messages = window.message_count,
            tokens = window.total_tokens,
            "context window built"
        );
        Ok(window)
    }

    /// Prefix `prompt` with the session's history.
    ///
    /// Returns the prompt unchanged when the window is disabled, empty, or
    /// the history cannot be read.
    pub async fn format_for_prompt(&self, session_id: &str, prompt: &str) -> String {
        if !self.enabled {
            return prompt.to_string();
        }
        match self.build(session_id).await {
            Ok(window) => render_prompt(&window, prompt),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "context history unavailable");
                prompt.to_string()
            }
        }
    }

    /// Breakdown of the session's most recent messages.
    pub async fn context_stats(&self, session_id: &str) -> Result<ContextStats, StorageError> {
        let history = self.store.history(session_id, STATS_SAMPLE_SIZE).await?;
        Ok(summarize(&history, &self.budget))
    }

    /// Whether recent history exceeds 80% of the token budget.
    pub async fn should_prune(&self, session_id: &str) -> Result<bool, StorageError> {
        let stats = self.context_stats(session_id).await?;
        Ok(self.budget.should_prune(stats.estimated_tokens))
    }
}
