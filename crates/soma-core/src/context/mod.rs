//! Context window assembly: token estimation, budgeted history selection,
//! and prompt formatting.

pub mod budget;
pub mod window;

pub use budget::{CHARS_PER_TOKEN, ContextBudget, estimate_tokens};
pub use window::{ContextWindow, ContextWindowBuilder};
