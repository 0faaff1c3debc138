//! Time-based retention of the conversation log.

pub mod sweeper;

pub use sweeper::RetentionSweeper;
