//! Durable store abstractions.
//!
//! This module defines the repository traits that the infrastructure layer
//! implements for the conversation log, identities, facts and maintenance.

pub mod repository;

#[cfg(test)]
pub(crate) mod memory;
