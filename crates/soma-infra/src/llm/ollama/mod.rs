//! Ollama completion backend.

pub mod client;
pub mod types;

pub use client::OllamaBackend;
