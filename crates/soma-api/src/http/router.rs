//! Axum router configuration with middleware.
//!
//! Turn and query routes live under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, request tracing, body size limit.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Largest accepted request body. Screenshots arrive base64-encoded.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Turns
        .route("/chat", post(handlers::chat::post_chat))
        .route("/vision", post(handlers::vision::post_vision))
        // Sessions
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route("/sessions/{id}/stats", get(handlers::session::get_stats))
        // Long-term memory
        .route("/identities", get(handlers::identity::list_identities))
        .route("/facts", get(handlers::identity::list_facts))
        .route("/search", get(handlers::search::search_messages))
        .route("/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
