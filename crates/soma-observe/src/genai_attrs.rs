//! OpenTelemetry GenAI semantic-convention attribute names.
//!
//! Completion calls are wrapped in a span named `"{operation} {model}"`
//! (e.g. `"generate llava"`) carrying these fields.

/// Operation performed against the completion backend.
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// Backend family, e.g. `"ollama"`.
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// Prompt tokens as reported by the backend.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Model that actually served the response.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

// Operation names

/// Plain text generation from a prompt.
pub const OP_GENERATE: &str = "generate";

/// Image description from a prompt plus image.
pub const OP_DESCRIBE_IMAGE: &str = "describe_image";

// Provider names

pub const PROVIDER_OLLAMA: &str = "ollama";

/// Span name for a completion call.
pub fn span_name(operation: &str, model: &str) -> String {
    format!("{operation} {model}")
}
