//! Learned facts keyed by `(category, key)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category under which identity assertions are mirrored as facts.
pub const IDENTITY_FACT_CATEGORY: &str = "identity";

/// Confidence recorded for facts derived from an explicit identity assertion.
pub const ASSERTED_IDENTITY_CONFIDENCE: f64 = 0.95;

/// A durable fact. Unique per `(category, key)`; upserts overwrite the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub category: String,
    pub key: String,
    pub value: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Clamp a confidence value into `[0, 1]`. NaN becomes 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
