//! CompletionBackend trait definition.
//!
//! The completion backend turns a prompt (and, for vision requests, image
//! bytes) into text. Uses RPITIT for `complete`, matching the store traits.
//!
//! Implementations live in soma-infra (e.g., `OllamaBackend`).

use std::time::Duration;

use soma_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use tracing::warn;

/// Trait for text and vision completion backends.
pub trait CompletionBackend: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and wait for the full completion.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

/// Run `backend.complete` with an upper bound on wall time.
///
/// An elapsed bound becomes `LlmError::Timeout`; nothing is retried.
pub async fn complete_within<B: CompletionBackend>(
    backend: &B,
    request: &CompletionRequest,
    limit: Duration,
) -> Result<CompletionResponse, LlmError> {
    match tokio::time::timeout(limit, backend.complete(request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                backend = backend.name(),
                kind = %request.kind,
                timeout_secs = limit.as_secs(),
                "completion timed out"
            );
            Err(LlmError::Timeout(limit.as_secs()))
        }
    }
}
