//! Identity and fact listings.
//!
//! - GET /api/v1/identities - All bindings, most recently seen first
//! - GET /api/v1/facts      - Facts, optionally filtered by `?category=`

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};

use soma_types::fact::Fact;
use soma_types::identity::IdentityBinding;

use crate::http::error::AppError;
use crate::http::extractors::query::FactQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/identities
pub async fn list_identities(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IdentityBinding>>>, AppError> {
    let start = Instant::now();
    let identities = state.conversation.get_all_identities().await?;
    Ok(Json(ApiResponse::timed(identities, start).with_link("self", "/api/v1/identities")))
}

/// GET /api/v1/facts
pub async fn list_facts(
    State(state): State<AppState>,
    Query(query): Query<FactQuery>,
) -> Result<Json<ApiResponse<Vec<Fact>>>, AppError> {
    let start = Instant::now();
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let facts = state.conversation.list_facts(category).await?;
    Ok(Json(ApiResponse::timed(facts, start)))
}
