//! `/api/memory/*` — remember (plus its `save` alias), recall, forget,
//! modify, recover. Each handler parses the wire body, calls into
//! `signet-ingest`/`signet-retrieval`/`signet-storage::tx`, and maps
//! the typed outcome back onto the spec §6 wire shape.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use signet_core::errors::SignetError;
use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content};
use signet_ingest::{remember, RememberRequest};
use signet_retrieval::recall as recall_pipeline;
use signet_retrieval::types::RecallRequest as PipelineRecallRequest;
use signet_storage::queries::memory_search::RecallFilters;
use signet_storage::tx::{self, ForgetOutcome, MemoryPatch, ModifyOutcome, RecoverOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct RememberBody {
    pub content: String,
    pub who: Option<String>,
    pub project: Option<String>,
    pub importance: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub pinned: Option<bool>,
}

pub async fn remember_handler(State(state): State<SharedState>, Json(body): Json<RememberBody>) -> ApiResult<Json<serde_json::Value>> {
    let req = RememberRequest {
        raw: body.content,
        who: body.who,
        project: body.project,
        importance: body.importance,
        tags: body.tags,
        pinned: body.pinned,
    };
    let result = remember(&state.accessor, state.embeddings.as_ref(), &state.config, req).await?;
    Ok(Json(serde_json::json!({
        "id": result.id,
        "type": result.memory_type.as_str(),
        "tags": result.tags,
        "pinned": result.pinned,
        "importance": result.importance,
        "content": result.content,
        "embedded": result.embedded,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RecallBody {
    pub query: String,
    pub limit: Option<usize>,
    #[serde(rename = "type")]
    pub memory_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub who: Option<String>,
    pub pinned: Option<bool>,
    pub importance_min: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RecallResponse {
    pub results: Vec<signet_retrieval::types::RecallItem>,
    pub query: String,
    pub method: &'static str,
}

pub async fn recall_handler(State(state): State<SharedState>, Json(body): Json<RecallBody>) -> ApiResult<Json<RecallResponse>> {
    if body.query.trim().is_empty() {
        return Err(ApiError(SignetError::BadRequest("query must not be empty".to_string())));
    }
    let filters = RecallFilters {
        memory_type: body.memory_type,
        tags: body.tags.unwrap_or_default(),
        who: body.who,
        pinned: body.pinned,
        importance_min: body.importance_min,
        since: body.since,
        until: body.until,
    };
    let req = PipelineRecallRequest {
        query: body.query.clone(),
        limit: body.limit.unwrap_or(state.config.search.top_k),
        filters,
    };
    let outcome = recall_pipeline(
        &state.accessor,
        state.embeddings.as_ref(),
        state.reranker.as_deref(),
        &state.config,
        req,
    )
    .await?;
    Ok(Json(RecallResponse {
        results: outcome.results,
        query: body.query,
        method: outcome.method,
    }))
}

fn parse_actor(actor_type: Option<ActorType>, session_id: Option<String>, request_id: Option<String>) -> MutationContext {
    MutationContext {
        actor_type: actor_type.unwrap_or(ActorType::Agent),
        session_id,
        request_id,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetBody {
    pub id: String,
    pub force: Option<bool>,
    pub actor_type: Option<ActorType>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub if_version: Option<u64>,
}

pub async fn forget_handler(State(state): State<SharedState>, Json(body): Json<ForgetBody>) -> ApiResult<Json<serde_json::Value>> {
    let ctx = parse_actor(body.actor_type, body.session_id, body.request_id);
    let outcome = state
        .accessor
        .with_write_tx(|conn| tx::forget(conn, &body.id, body.force.unwrap_or(false), body.if_version, &ctx, Utc::now()))?;
    match outcome {
        ForgetOutcome::Deleted => Ok(Json(serde_json::json!({"id": body.id, "deleted": true}))),
        ForgetOutcome::NotFound => Err(ApiError(SignetError::NotFound(format!("memory {} not found", body.id)))),
        ForgetOutcome::AlreadyDeleted => Ok(Json(serde_json::json!({"id": body.id, "deleted": true, "already_deleted": true}))),
        ForgetOutcome::VersionConflict => Err(ApiError(SignetError::VersionConflict)),
        ForgetOutcome::PinnedRequiresForce => Err(ApiError(SignetError::PinnedRequiresForce)),
        ForgetOutcome::AutonomousForceDenied => Err(ApiError(SignetError::AutonomousForceDenied)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyBody {
    pub id: String,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub importance: Option<f64>,
    pub pinned: Option<bool>,
    pub who: Option<String>,
    pub why: Option<String>,
    pub project: Option<String>,
    pub updated_by: Option<String>,
    pub actor_type: Option<ActorType>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub if_version: Option<u64>,
}

pub async fn modify_handler(State(state): State<SharedState>, Json(body): Json<ModifyBody>) -> ApiResult<Json<serde_json::Value>> {
    let ctx = parse_actor(body.actor_type, body.session_id, body.request_id);
    let (normalized_content, hash) = match &body.content {
        Some(c) => {
            let normalized = normalize_content(c);
            let hash = content_hash(&normalized);
            (Some(normalized), Some(hash))
        }
        None => (None, None),
    };
    let patch = MemoryPatch {
        content: body.content,
        normalized_content,
        content_hash: hash,
        tags: body.tags,
        importance: body.importance,
        pinned: body.pinned,
        who: body.who,
        why: body.why,
        project: body.project,
        updated_by: body.updated_by,
        new_vector: None,
        embedding_model: None,
    };
    let outcome = state
        .accessor
        .with_write_tx(|conn| tx::modify(conn, &body.id, patch, body.if_version, &ctx, Utc::now()))?;
    match outcome {
        ModifyOutcome::Updated(memory) => Ok(Json(serde_json::to_value(memory).map_err(|e| ApiError(SignetError::Internal(e.to_string())))?)),
        ModifyOutcome::NoChanges => Err(ApiError(SignetError::BadRequest("patch applied no changes".to_string()))),
        ModifyOutcome::NotFound => Err(ApiError(SignetError::NotFound(format!("memory {} not found", body.id)))),
        ModifyOutcome::Deleted => Err(ApiError(SignetError::NotFound(format!("memory {} is deleted", body.id)))),
        ModifyOutcome::VersionConflict => Err(ApiError(SignetError::VersionConflict)),
        ModifyOutcome::DuplicateContentHash => Err(ApiError(SignetError::DuplicateContentHash)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverBody {
    pub id: String,
    pub actor_type: Option<ActorType>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub if_version: Option<u64>,
}

pub async fn recover_handler(State(state): State<SharedState>, Json(body): Json<RecoverBody>) -> ApiResult<Json<serde_json::Value>> {
    let ctx = parse_actor(body.actor_type, body.session_id, body.request_id);
    let window_ms = state.config.retention.window_ms;
    let outcome = state
        .accessor
        .with_write_tx(|conn| tx::recover(conn, &body.id, window_ms, body.if_version, &ctx, Utc::now()))?;
    match outcome {
        RecoverOutcome::Recovered => Ok(Json(serde_json::json!({"id": body.id, "recovered": true}))),
        RecoverOutcome::NotFound => Err(ApiError(SignetError::NotFound(format!("memory {} not found", body.id)))),
        RecoverOutcome::NotDeleted => Err(ApiError(SignetError::BadRequest(format!("memory {} is not deleted", body.id)))),
        RecoverOutcome::VersionConflict => Err(ApiError(SignetError::VersionConflict)),
        RecoverOutcome::RetentionExpired => Err(ApiError(SignetError::RetentionExpired)),
    }
}
