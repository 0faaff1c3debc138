//! SQLite storage layer.
//!
//! One database file with WAL mode and split read/write pools. The store
//! implementation is spread across one module per record set.

mod conversation;
mod fact;
mod identity;
mod maintenance;
pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteMemoryStore;
