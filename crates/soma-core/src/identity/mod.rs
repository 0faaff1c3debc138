//! Identity handling for the last screenshot: intent matching and
//! explicit-only binding and resolution.

pub mod intent;
pub mod resolver;

pub use intent::{Intent, classify};
pub use resolver::{BindOutcome, IdentityResolver, Resolution, recall_reply};
