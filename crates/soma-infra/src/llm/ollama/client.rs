//! `OllamaBackend`: [`CompletionBackend`] over Ollama's `/api/generate`.
//!
//! Chat requests go to the configured chat model, vision requests to the
//! vision model with the image attached as base64. Every call is
//! non-streaming and runs inside a GenAI span.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{Instrument, Span, debug, info_span};

use soma_core::completion::CompletionBackend;
use soma_observe::genai_attrs::{
    GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MAX_TOKENS, GEN_AI_REQUEST_MODEL,
    GEN_AI_REQUEST_TEMPERATURE, GEN_AI_RESPONSE_MODEL, GEN_AI_USAGE_INPUT_TOKENS,
    GEN_AI_USAGE_OUTPUT_TOKENS, OP_DESCRIBE_IMAGE, OP_GENERATE, PROVIDER_OLLAMA, span_name,
};
use soma_types::config::LlmConfig;
use soma_types::llm::{CompletionKind, CompletionRequest, CompletionResponse, LlmError};

use super::types::{ErrorResponse, GenerateOptions, GenerateRequest, GenerateResponse};

/// HTTP client for a local (or remote) Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    vision_model: String,
}

impl OllamaBackend {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model serving requests of `kind`.
    pub fn model_for(&self, kind: CompletionKind) -> &str {
        match kind {
            CompletionKind::Chat => &self.chat_model,
            CompletionKind::Vision => &self.vision_model,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn to_generate_request(&self, request: &CompletionRequest) -> GenerateRequest {
        let options = GenerateOptions {
            num_predict: request.max_tokens,
            temperature: request.temperature,
        };
        GenerateRequest {
            model: self.model_for(request.kind).to_string(),
            prompt: request.prompt.clone(),
            images: request.images.iter().map(|img| BASE64.encode(img)).collect(),
            stream: false,
            options: options.non_empty(),
        }
    }

    async fn send(&self, body: &GenerateRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(self.generate_url())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Unreachable(e.to_string())
                } else {
                    LlmError::Provider {
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                message: format!("HTTP {status}: {}", provider_message(&error_body)),
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let span = Span::current();
        span.record(GEN_AI_USAGE_INPUT_TOKENS, generated.prompt_eval_count)
            .record(GEN_AI_USAGE_OUTPUT_TOKENS, generated.eval_count);

        let completion = into_completion(generated, &body.model);
        span.record(GEN_AI_RESPONSE_MODEL, completion.model.as_str());
        Ok(completion)
    }
}

/// Span wrapping one completion call, named `"{operation} {model}"`.
fn completion_span(operation: &str, model: &str, request: &CompletionRequest) -> Span {
    info_span!(
        "gen_ai.complete",
        otel.name = %span_name(operation, model),
        { GEN_AI_OPERATION_NAME } = operation,
        { GEN_AI_PROVIDER_NAME } = PROVIDER_OLLAMA,
        { GEN_AI_REQUEST_MODEL } = model,
        { GEN_AI_REQUEST_MAX_TOKENS } = request.max_tokens,
        { GEN_AI_REQUEST_TEMPERATURE } = request.temperature,
        { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
        { GEN_AI_USAGE_OUTPUT_TOKENS } = tracing::field::Empty,
        { GEN_AI_RESPONSE_MODEL } = tracing::field::Empty,
    )
}

/// Pull the `error` field out of an Ollama error body, else return it raw.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}

fn into_completion(generated: GenerateResponse, requested_model: &str) -> CompletionResponse {
    let model = if generated.model.is_empty() {
        requested_model.to_string()
    } else {
        generated.model
    };
    CompletionResponse {
        content: generated.response.trim().to_string(),
        model,
    }
}

impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        PROVIDER_OLLAMA
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_generate_request(request);
        let operation = match request.kind {
            CompletionKind::Chat => OP_GENERATE,
            CompletionKind::Vision => OP_DESCRIBE_IMAGE,
        };

        let span = completion_span(operation, &body.model, request);

        debug!(
            kind = %request.kind,
            prompt_len = request.prompt.len(),
            images = request.images.len(),
            "sending completion request"
        );
        self.send(&body).instrument(span).await
    }
}
