//! Route table for the HTTP surface (spec §4.N / §6). Mirrors the
//! teacher's `Router::new().route(...).with_state(state)` shape,
//! generalized from one transport endpoint to the full memory API.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers::{diagnostics, hooks, list, memory, repair, search};
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/memory/remember", post(memory::remember_handler))
        .route("/api/memory/save", post(memory::remember_handler))
        .route("/api/memory/recall", post(memory::recall_handler))
        .route("/api/memory/forget", post(memory::forget_handler))
        .route("/api/memory/modify", post(memory::modify_handler))
        .route("/api/memory/recover", post(memory::recover_handler))
        .route("/memory/search", get(search::search_handler))
        .route("/memory/similar", get(search::similar_handler))
        .route("/api/memories", get(list::list_handler))
        .route("/api/hooks/session-start", post(hooks::session_start_handler))
        .route("/api/repair/:action", post(repair::run_repair_handler))
        .route("/api/embeddings/status", get(diagnostics::embeddings_status_handler))
        .route("/api/embeddings/health", get(diagnostics::embeddings_health_handler))
        .route("/health", get(diagnostics::health_handler))
        .route("/api/status", get(diagnostics::status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
