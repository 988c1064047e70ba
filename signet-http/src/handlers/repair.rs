//! `POST /api/repair/{action}` — dispatches into the repair registry
//! (spec §4.J). The path segment is the action name; the registry
//! itself rejects anything unrecognized with `unknown_action`.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use signet_core::history::ActorType;
use signet_repair::RepairContext;

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct RepairBody {
    pub reason: String,
    pub actor: String,
    #[serde(rename = "actorType")]
    pub actor_type: ActorType,
    #[serde(rename = "dryRun")]
    pub dry_run: Option<bool>,
    #[serde(rename = "maxBatch")]
    pub max_batch: Option<usize>,
}

pub async fn run_repair_handler(
    State(state): State<SharedState>,
    Path(action): Path<String>,
    Json(body): Json<RepairBody>,
) -> ApiResult<Json<signet_repair::RepairOutcome>> {
    let ctx = RepairContext {
        accessor: state.accessor.clone(),
        embeddings: state.embeddings.clone(),
        config: state.config.clone(),
        actor: body.actor,
        actor_type: body.actor_type,
        reason: body.reason,
        dry_run: body.dry_run.unwrap_or(false),
        max_batch: body.max_batch,
    };
    let outcome = state.repair.run(&action, ctx).await?;
    Ok(Json(outcome))
}
