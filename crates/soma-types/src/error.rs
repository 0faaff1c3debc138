use thiserror::Error;

/// Errors from the durable store.
///
/// The conversation core treats these as advisory: a failed write is logged
/// and the turn continues with degraded memory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("invalid stored value: {0}")]
    Decode(String),
}
