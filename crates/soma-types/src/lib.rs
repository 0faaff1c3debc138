//! Shared domain types for the Soma memory core.
//!
//! Messages, identity bindings, facts, sessions, working memory, completion
//! requests, configuration, and the error types that cross crate boundaries.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod fact;
pub mod identity;
pub mod llm;
pub mod message;
pub mod session;
pub mod stats;
