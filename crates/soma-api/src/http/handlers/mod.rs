//! HTTP request handlers.

pub mod chat;
pub mod identity;
pub mod search;
pub mod session;
pub mod stats;
pub mod vision;
