//! GET /api/v1/stats - Store-wide counts and working-memory occupancy.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use soma_types::stats::StoreStats;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub store: StoreStats,
    pub cached_sessions: usize,
    pub session_cache_capacity: usize,
    pub retention_days: u32,
}

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsData>>, AppError> {
    let start = Instant::now();
    let store = state.conversation.store_stats().await?;
    let cache = state.conversation.session_cache();

    let data = StatsData {
        store,
        cached_sessions: cache.len(),
        session_cache_capacity: cache.capacity(),
        retention_days: state.config().retention_days,
    };
    Ok(Json(
        ApiResponse::timed(data, start)
            .with_link("self", "/api/v1/stats")
            .with_link("identities", "/api/v1/identities"),
    ))
}
