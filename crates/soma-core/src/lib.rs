//! Memory management logic and port definitions for Soma.
//!
//! This crate defines the "ports" (store traits, the completion backend and
//! the image fingerprinter) that the infrastructure layer implements, plus
//! the logic built on them: context windows, working memory, identity
//! resolution, retention and turn orchestration. It depends only on
//! `soma-types` -- never on `soma-infra` or any database/IO crate.

pub mod completion;
pub mod context;
pub mod identity;
pub mod retention;
pub mod service;
pub mod session;
pub mod store;
