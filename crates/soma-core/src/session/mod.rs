//! Per-session working memory.

pub mod cache;

pub use cache::{SessionHandle, SessionMemoryCache};
