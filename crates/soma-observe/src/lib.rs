//! Observability for the Soma memory core: tracing subscriber setup and
//! GenAI span attribute names.

pub mod genai_attrs;
pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing};
