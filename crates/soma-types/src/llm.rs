//! Completion backend request/response types.
//!
//! The completion backend is an external service: it takes a prompt (and,
//! for vision, images) and returns a text completion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which model family a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Chat,
    Vision,
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionKind::Chat => write!(f, "chat"),
            CompletionKind::Vision => write!(f, "vision"),
        }
    }
}

/// A single-prompt completion request.
///
/// Images are raw bytes; adapters encode them for their wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub kind: CompletionKind,
    pub prompt: String,
    pub images: Vec<Vec<u8>>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    /// A plain chat completion with backend defaults.
    pub fn chat(prompt: impl Into<String>) -> Self {
        Self {
            kind: CompletionKind::Chat,
            prompt: prompt.into(),
            images: Vec::new(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// A vision completion over one image.
    pub fn vision(prompt: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            kind: CompletionKind::Vision,
            prompt: prompt.into(),
            images: vec![image],
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Text returned by the completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// Errors from the completion backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion backend unreachable: {0}")]
    Unreachable(String),

    #[error("completion backend timed out after {0}s")]
    Timeout(u64),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}
