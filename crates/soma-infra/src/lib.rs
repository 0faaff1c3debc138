//! Infrastructure layer for the Soma memory core.
//!
//! Implements the ports defined in `soma-core`: the SQLite memory store, the
//! Ollama completion backend, and the SHA-256 image fingerprinter. Also owns
//! config loading and data-directory resolution.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod llm;
pub mod sqlite;

#[cfg(test)]
mod end_to_end;
