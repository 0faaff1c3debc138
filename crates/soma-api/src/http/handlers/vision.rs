//! Vision turn endpoint.
//!
//! POST /api/v1/vision - Submit a base64 screenshot. The image becomes the
//! session's last observation and its summary is returned.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use soma_core::service::VisionTurnReply;

use crate::http::error::AppError;
use crate::http::extractors::session::{SessionQuery, pick_session_id};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for a vision turn.
#[derive(Debug, Deserialize)]
pub struct VisionRequest {
    /// Base64 image, optionally as a `data:` URL.
    #[serde(default)]
    pub image_b64: String,
    #[serde(default)]
    pub window_title: String,
    pub session_id: Option<String>,
}

/// Decode a base64 image, accepting a `data:image/...;base64,` prefix.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, AppError> {
    let encoded = encoded.trim();
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    BASE64
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("image_b64 is not valid base64: {e}")))
}

/// POST /api/v1/vision
pub async fn post_vision(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    body: Result<Json<VisionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VisionTurnReply>>, AppError> {
    let start = Instant::now();
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let image = decode_image(&body.image_b64)?;
    let session_id = pick_session_id(&headers, body.session_id.as_deref(), query.session_id.as_deref());
    let reply = state
        .conversation
        .submit_vision_turn(session_id, &image, &body.window_title)
        .await?;

    Ok(Json(ApiResponse::timed(reply, start)))
}
