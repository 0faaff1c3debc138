//! Per-session read endpoints.
//!
//! - GET /api/v1/sessions/{id}/messages - Recent history, oldest first
//! - GET /api/v1/sessions/{id}/stats    - Context stats and prune hint

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Serialize;

use soma_core::store::repository::ConversationLog;
use soma_types::message::Message;
use soma_types::session::Session;
use soma_types::stats::ContextStats;

use crate::http::error::AppError;
use crate::http::extractors::query::{HistoryQuery, clamp_limit};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/sessions/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let messages = state
        .conversation
        .get_history(&session_id, clamp_limit(query.limit))
        .await?;

    let resp = ApiResponse::timed(messages, start)
        .with_link("self", &format!("/api/v1/sessions/{session_id}/messages"))
        .with_link("stats", &format!("/api/v1/sessions/{session_id}/stats"));
    Ok(Json(resp))
}

#[derive(Debug, Serialize)]
pub struct SessionStatsData {
    #[serde(flatten)]
    pub context: ContextStats,
    pub should_prune: bool,
    /// Registry row, absent until the session logs its first message.
    pub session: Option<Session>,
}

/// GET /api/v1/sessions/{id}/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionStatsData>>, AppError> {
    let start = Instant::now();
    let conversation = &state.conversation;

    let context = conversation.get_context_stats(&session_id).await?;
    let should_prune = conversation.should_prune(&session_id).await?;
    let session = conversation.store().get_session(&session_id).await?;

    let data = SessionStatsData {
        context,
        should_prune,
        session,
    };
    Ok(Json(
        ApiResponse::timed(data, start)
            .with_link("messages", &format!("/api/v1/sessions/{session_id}/messages")),
    ))
}
