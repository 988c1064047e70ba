//! `POST /api/hooks/session-start` (spec §4.K `handleSessionStart`).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use signet_session::{SessionHooks, SessionStartOutcome};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct SessionStartBody {
    pub harness: Option<String>,
    #[serde(rename = "sessionKey")]
    pub session_key: Option<String>,
    pub query: Option<String>,
}

pub async fn session_start_handler(State(state): State<SharedState>, Json(body): Json<SessionStartBody>) -> ApiResult<Json<SessionStartOutcome>> {
    let hooks = SessionHooks {
        accessor: &state.accessor,
        embeddings: state.embeddings.as_ref(),
        reranker: state.reranker.as_deref(),
        config: &state.config,
    };
    let query = body.query.unwrap_or_default();
    let harness = body.harness.unwrap_or_else(|| "unknown".to_string());
    tracing::debug!(%harness, "session-start hook invoked");
    let outcome = state.sessions.handle_session_start(&hooks, body.session_key.as_deref(), &query).await?;
    Ok(Json(outcome))
}
