//! Application services.
//!
//! `ConversationService` orchestrates turns; `ImageFingerprinter` is the port
//! it uses to content-address screenshots.

pub mod conversation;
pub mod hash;

pub use conversation::{
    ConversationService, TEMP_SESSION_PREFIX, TextTurnReply, TurnError, VisionTurnReply,
};
pub use hash::ImageFingerprinter;
