//! Query parameters for the read endpoints.

use serde::Deserialize;

/// Upper bound on any `limit` parameter.
pub const MAX_LIMIT: usize = 1000;

/// `?limit=` for history listings.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    50
}

/// `?q=&limit=&case_sensitive=` for message search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default)]
    pub case_sensitive: bool,
}

fn default_search_limit() -> usize {
    20
}

/// `?category=` for fact listings.
#[derive(Debug, Deserialize, Default)]
pub struct FactQuery {
    pub category: Option<String>,
}

/// Cap a caller-supplied limit at `MAX_LIMIT`. Zero stays zero.
pub fn clamp_limit(limit: usize) -> usize {
    limit.min(MAX_LIMIT)
}
