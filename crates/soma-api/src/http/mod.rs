//! HTTP API for the memory core.
//!
//! Axum routes under `/api/v1/` with the `{data, meta, errors}` envelope.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
