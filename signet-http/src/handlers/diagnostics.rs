//! `GET /api/embeddings/status`, `GET /api/embeddings/health`,
//! `GET /health`, `GET /api/status` (spec §4.M, §4.N).

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use signet_diagnostics::HealthReporter;
use signet_storage::queries::memory_crud;

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct EmbeddingsStatus {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub reachable: bool,
    pub error: Option<String>,
    pub active_memories: i64,
    pub embedded_memories: i64,
}

pub async fn embeddings_status_handler(State(state): State<SharedState>) -> ApiResult<Json<EmbeddingsStatus>> {
    let availability = state.embeddings.available().await;
    let active = state.accessor.with_read_db(memory_crud::count_active)?;
    let embedded = state.accessor.with_read_db(signet_storage::queries::maintenance::count_embedded_active)?;
    Ok(Json(EmbeddingsStatus {
        provider: state.config.embedding.provider.clone(),
        model: state.embeddings.model_name().to_string(),
        dimensions: state.embeddings.dimensions(),
        reachable: availability.available,
        error: availability.error,
        active_memories: active,
        embedded_memories: embedded,
    }))
}

pub async fn embeddings_health_handler(State(state): State<SharedState>) -> ApiResult<Json<signet_diagnostics::HealthReport>> {
    let report = HealthReporter::build(&state.accessor, state.embeddings.as_ref(), &state.config).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
}

pub async fn health_handler() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active_memories: i64,
    pub embedding_health: signet_diagnostics::HealthReport,
}

pub async fn status_handler(State(state): State<SharedState>) -> ApiResult<Json<StatusResponse>> {
    let active = state.accessor.with_read_db(memory_crud::count_active)?;
    let embedding_health = HealthReporter::build(&state.accessor, state.embeddings.as_ref(), &state.config).await?;
    Ok(Json(StatusResponse {
        active_memories: active,
        embedding_health,
    }))
}
