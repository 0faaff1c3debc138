//! GET /api/v1/search - Substring search over the conversation log.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};

use soma_types::message::Message;

use crate::http::error::AppError;
use crate::http::extractors::query::{SearchQuery, clamp_limit};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Newest matches first. `q` must be non-blank.
pub async fn search_messages(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    if query.q.trim().is_empty() {
        return Err(AppError::Validation("query parameter 'q' is required".to_string()));
    }

    let results = state
        .conversation
        .search_messages(&query.q, clamp_limit(query.limit), query.case_sensitive)
        .await?;
    Ok(Json(ApiResponse::timed(results, start)))
}
