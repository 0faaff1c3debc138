//! Token and message budgets for the conversation context window.
//!
//! Token counts are estimates: content byte length divided by a fixed
//! characters-per-token ratio, rounded up. No tokenizer is involved.

use soma_types::config::MemoryConfig;

/// Default characters-per-token divisor.
pub const CHARS_PER_TOKEN: usize = 4;

/// Number of recent messages examined by stats and the prune advisory.
pub const STATS_SAMPLE_SIZE: usize = 100;

/// Estimate the token cost of `text` with the default divisor.
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_with(text, CHARS_PER_TOKEN)
}

/// Estimate the token cost of `text` as `ceil(bytes / chars_per_token)`.
pub fn estimate_tokens_with(text: &str, chars_per_token: usize) -> usize {
    text.len().div_ceil(chars_per_token.max(1))
}

/// The two simultaneous limits a context window must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_messages: usize,
    pub max_tokens: usize,
    pub chars_per_token: usize,
}

impl ContextBudget {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            max_messages,
            max_tokens,
            chars_per_token: CHARS_PER_TOKEN,
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.max_context_messages, config.max_context_tokens)
    }

    /// Override the characters-per-token divisor.
    pub fn with_chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.chars_per_token = chars_per_token.max(1);
        self
    }

    /// How many recent messages to fetch before trimming.
    pub fn fetch_limit(&self) -> usize {
        self.max_messages.saturating_mul(2)
    }

    pub fn estimate(&self, text: &str) -> usize {
        estimate_tokens_with(text, self.chars_per_token)
    }

    /// Whether history has grown past 80% of the token budget.
    ///
    /// Advisory only; nothing is pruned automatically.
    pub fn should_prune(&self, history_tokens: usize) -> bool {
        history_tokens > self.max_tokens * 80 / 100
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}
