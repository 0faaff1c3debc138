//! Text turn endpoint.
//!
//! POST /api/v1/chat - Submit a text turn. Deterministic intents are
//! answered from memory; everything else goes to the chat model.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;

use soma_core::service::TextTurnReply;

use crate::http::error::AppError;
use crate::http::extractors::session::{SessionQuery, pick_session_id};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for a text turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub text: String,
    pub session_id: Option<String>,
}

/// POST /api/v1/chat
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TextTurnReply>>, AppError> {
    let start = Instant::now();
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let session_id = pick_session_id(&headers, body.session_id.as_deref(), query.session_id.as_deref());
    let reply = state
        .conversation
        .submit_text_turn(session_id, &body.text)
        .await?;

    let history = format!("/api/v1/sessions/{}/messages", reply.session_id);
    Ok(Json(ApiResponse::timed(reply, start).with_link("history", &history)))
}
