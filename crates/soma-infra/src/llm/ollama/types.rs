//! Wire types for Ollama's `/api/generate` endpoint.
//!
//! These are Ollama-specific; the backend-agnostic request/response types
//! live in soma-types.

use serde::{Deserialize, Serialize};

/// Request body for a non-streaming generate call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Base64-encoded images, vision models only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Sampling options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl GenerateOptions {
    /// `None` when every option is unset, so the field is omitted entirely.
    pub fn non_empty(self) -> Option<Self> {
        if self == Self::default() { None } else { Some(self) }
    }
}

/// Response body of a non-streaming generate call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

/// Error body Ollama returns with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
