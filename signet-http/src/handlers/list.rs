//! `GET /api/memories` — paginated listing plus a total-count stat.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use signet_storage::queries::memory_crud;

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub memories: Vec<signet_core::memory::Memory>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_handler(State(state): State<SharedState>, Query(q): Query<ListQuery>) -> ApiResult<Json<ListResponse>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 1000);
    let offset = q.offset.unwrap_or(0).max(0);
    let memories = state.accessor.with_read_db(|conn| memory_crud::list_paginated(conn, limit, offset))?;
    let total = state.accessor.with_read_db(memory_crud::count_active)?;
    Ok(Json(ListResponse { memories, total, limit, offset }))
}
