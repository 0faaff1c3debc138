//! Configuration types for the memory core.
//!
//! `MemoryConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Messages and sessions older than this many days are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Maximum number of prior messages in a context window.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Maximum estimated tokens in a context window.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Sessions kept in working memory before LRU eviction.
    #[serde(default = "default_session_cache_capacity")]
    pub session_cache_capacity: usize,

    #[serde(default)]
    pub features: FeatureToggles,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_retention_days() -> u32 {
    30
}

fn default_max_context_messages() -> usize {
    10
}

fn default_max_context_tokens() -> usize {
    4000
}

fn default_session_cache_capacity() -> usize {
    1024
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            max_context_messages: default_max_context_messages(),
            max_context_tokens: default_max_context_tokens(),
            session_cache_capacity: default_session_cache_capacity(),
            features: FeatureToggles::default(),
            retention: RetentionConfig::default(),
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Switches for the optional memory components.
///
/// Turning one off makes that component a no-op; the others keep their
/// contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Persist every turn to the conversation log.
    #[serde(default = "enabled")]
    pub long_term_logging: bool,

    /// Prepend budgeted history to open-ended prompts.
    #[serde(default = "enabled")]
    pub context_window: bool,

    /// Write identity bindings to, and read them from, the durable store.
    #[serde(default = "enabled")]
    pub identity_persistence: bool,
}

fn enabled() -> bool {
    true
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            long_term_logging: true,
            context_window: true,
            identity_persistence: true,
        }
    }
}

/// Scheduling of the background retention sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Delay after startup before the first sweep.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Repeat the sweep at this interval. `None` runs it once per process.
    #[serde(default)]
    pub interval_hours: Option<u64>,
}

fn default_warmup_secs() -> u64 {
    5
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            warmup_secs: default_warmup_secs(),
            interval_hours: None,
        }
    }
}

/// Connection settings for the completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Upper bound on a single completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_vision_max_tokens")]
    pub vision_max_tokens: u32,

    #[serde(default = "default_vision_temperature")]
    pub vision_temperature: f64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_vision_model() -> String {
    "llava".to_string()
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_vision_max_tokens() -> u32 {
    120
}

fn default_vision_temperature() -> f64 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
            timeout_secs: default_timeout_secs(),
            vision_max_tokens: default_vision_max_tokens(),
            vision_temperature: default_vision_temperature(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7171
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
