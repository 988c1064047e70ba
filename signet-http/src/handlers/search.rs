//! `GET /memory/search` (keyword-only shortcut) and `GET /memory/similar`
//! (vector nearest-neighbors of a memory's own embedding).

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use signet_core::errors::SignetError;
use signet_storage::queries::memory_search::RecallFilters;
use signet_storage::queries::{memory_search, vector_search};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(rename = "type")]
    pub memory_type: Option<String>,
    pub tags: Option<String>,
    pub who: Option<String>,
    pub pinned: Option<i64>,
    pub importance_min: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<signet_core::memory::Memory>,
}

pub async fn search_handler(State(state): State<SharedState>, Query(q): Query<SearchQuery>) -> ApiResult<Json<SearchResponse>> {
    if q.q.trim().is_empty() {
        return Err(ApiError(SignetError::BadRequest("q must not be empty".to_string())));
    }
    let filters = RecallFilters {
        memory_type: q.memory_type,
        tags: q.tags.map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()).unwrap_or_default(),
        who: q.who,
        pinned: q.pinned.map(|p| p != 0),
        importance_min: q.importance_min,
        since: q.since,
        until: None,
    };
    let limit = q.limit.unwrap_or(state.config.search.top_k);
    let results = state.accessor.with_read_db(|conn| memory_search::search_fts_simple(conn, &q.q, &filters, limit))?;
    Ok(Json(SearchResponse { results }))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub id: String,
    pub k: Option<usize>,
    #[serde(rename = "type")]
    pub memory_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub results: Vec<SimilarItem>,
}

#[derive(Debug, Serialize)]
pub struct SimilarItem {
    #[serde(flatten)]
    pub memory: signet_core::memory::Memory,
    pub score: f64,
}

pub async fn similar_handler(State(state): State<SharedState>, Query(q): Query<SimilarQuery>) -> ApiResult<Json<SimilarResponse>> {
    let k = q.k.unwrap_or(10);
    let target_id = q.id.clone();
    let own_vector = state
        .accessor
        .with_read_db(|conn| vector_search::get_vector_for_memory(conn, &target_id))?
        .ok_or_else(|| ApiError(SignetError::NotFound(format!("no embedding for memory {target_id}"))))?;

    let memory_type = q.memory_type.clone();
    let neighbors = state
        .accessor
        .with_read_db(|conn| vector_search::search_vector(conn, &own_vector, k + 1, memory_type.as_deref()))?;

    let results = neighbors
        .into_iter()
        .filter(|(m, _)| m.id != q.id)
        .take(k)
        .map(|(memory, score)| SimilarItem { memory, score })
        .collect();

    Ok(Json(SimilarResponse { results }))
}
