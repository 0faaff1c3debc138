//! Completion backend adapters.
//!
//! Concrete implementations of the [`CompletionBackend`] port from
//! soma-core.
//!
//! [`CompletionBackend`]: soma_core::completion::CompletionBackend

pub mod ollama;

pub use ollama::OllamaBackend;
