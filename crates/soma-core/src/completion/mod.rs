//! Completion backend port.

pub mod backend;

pub use backend::{CompletionBackend, complete_within};
