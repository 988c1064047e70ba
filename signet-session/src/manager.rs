use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_core::session::{ContinuitySnapshot, ContinuityState};
use signet_core::traits::EmbeddingProvider;
use signet_retrieval::engine::recall;
use signet_retrieval::reranker::Reranker;
use signet_retrieval::types::{RecallItem, RecallRequest};
use signet_storage::queries::memory_search::RecallFilters;
use signet_storage::queries::session as session_queries;
use signet_core::session::SessionCandidateRecord;
use signet_storage::Accessor;

/// Result of `handle_session_start`: the recall candidates to inject
/// plus whether injection should actually happen (always true today —
/// kept as a field because the HTTP layer threads it straight to the
/// wire shape named in spec §6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStartOutcome {
    pub inject: bool,
    pub candidates: Vec<RecallItem>,
}

/// Process-wide singleton: one `ContinuityState` per session key, plus
/// the rate-limiter-shaped rule that it only ever grows bounded ring
/// buffers. Held behind a `DashMap` exactly as the teacher holds its
/// per-session token-budget state.
#[derive(Default)]
pub struct SessionManager {
    continuity: DashMap<String, ContinuityState>,
}

pub struct SessionHooks<'a> {
    pub accessor: &'a Accessor,
    pub embeddings: &'a dyn EmbeddingProvider,
    pub reranker: Option<&'a dyn Reranker>,
    pub config: &'a SignetConfig,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init_continuity(&self, session_key: &str) {
        self.continuity
            .entry(session_key.to_string())
            .or_insert_with(|| ContinuityState::new(session_key, Utc::now()));
    }

    pub fn record_prompt(&self, session_key: &str, snippet: &str) {
        self.continuity
            .entry(session_key.to_string())
            .or_insert_with(|| ContinuityState::new(session_key, Utc::now()))
            .record_prompt(snippet);
    }

    pub fn record_remember(&self, session_key: &str, snippet: &str) {
        self.continuity
            .entry(session_key.to_string())
            .or_insert_with(|| ContinuityState::new(session_key, Utc::now()))
            .record_remember(snippet);
    }

    pub fn record_query(&self, session_key: &str, term: &str) {
        self.continuity
            .entry(session_key.to_string())
            .or_insert_with(|| ContinuityState::new(session_key, Utc::now()))
            .record_query(term);
    }

    pub fn should_checkpoint(&self, session_key: &str, cfg: &SignetConfig) -> bool {
        let now = Utc::now();
        self.continuity
            .get(session_key)
            .map(|state| state.should_checkpoint(now, cfg.continuity.time_interval_ms, cfg.continuity.prompt_interval))
            .unwrap_or(false)
    }

    /// Snapshot and reset the interval counters atomically. Returns
    /// `None` if the session was never initialized.
    pub fn consume_state(&self, session_key: &str) -> Option<ContinuitySnapshot> {
        self.continuity.get_mut(session_key).map(|mut state| state.consume(Utc::now()))
    }

    pub fn clear_continuity(&self, session_key: &str) {
        self.continuity.remove(session_key);
    }

    /// spec §4.K `handleSessionStart`: run recall, and if a session key
    /// was supplied, record every returned candidate keyed by session
    /// so a later `track_fts_hits` can correlate a keyword re-hit.
    pub async fn handle_session_start(
        &self,
        hooks: &SessionHooks<'_>,
        session_key: Option<&str>,
        query: &str,
    ) -> SignetResult<SessionStartOutcome> {
        let req = RecallRequest {
            query: query.to_string(),
            limit: hooks.config.search.top_k,
            filters: RecallFilters::default(),
        };
        let outcome = recall(hooks.accessor, hooks.embeddings, hooks.reranker, hooks.config, req).await?;
        let candidates = outcome.results;

        if let Some(key) = session_key {
            self.init_continuity(key);
            let now = Utc::now();
            for item in &candidates {
                let record = SessionCandidateRecord {
                    session_key: key.to_string(),
                    memory_id: item.memory_id.clone(),
                    score: item.score,
                    source: item.source.to_string(),
                    injected: true,
                    fts_hit: false,
                    created_at: now,
                };
                hooks.accessor.with_write_tx(|conn| session_queries::record_candidate(conn, &record))?;
            }
        }

        Ok(SessionStartOutcome { inject: true, candidates })
    }

    /// spec §4.K `trackFtsHits`: flag which earlier candidates in this
    /// session were revisited by a keyword search.
    pub fn track_fts_hits(&self, accessor: &Accessor, session_key: &str, memory_ids: &[String]) -> SignetResult<usize> {
        accessor.with_write_tx(|conn| session_queries::mark_fts_hits(conn, session_key, memory_ids))
    }
}

/// Convenience alias for callers that want to share one manager behind
/// an `Arc` (the daemon's `AppState` does).
pub type SharedSessionManager = Arc<SessionManager>;
