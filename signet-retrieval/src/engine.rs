//! Orchestrates the 9-step hybrid recall pipeline (spec §4.G):
//! keyword -> vector -> fuse -> rehearsal -> graph -> rerank ->
//! truncate -> access-bump -> rationale-link.

use std::time::{Duration, Instant};

use chrono::Utc;
use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_core::traits::EmbeddingProvider;
use signet_storage::queries::{memory_search, vector_search};
use signet_storage::tx;
use signet_storage::Accessor;

use crate::fuse::fuse;
use crate::graph::{apply_graph_boost, link_decision_rationales};
use crate::rehearsal::apply_rehearsal_boost;
use crate::reranker::{apply_reranker, Reranker};
use crate::types::{Candidate, RecallItem, RecallOutcome, RecallRequest, RecallSource};

const TRUNCATION_SENTINEL: &str = " [truncated]";

pub async fn recall(
    accessor: &Accessor,
    embeddings: &dyn EmbeddingProvider,
    reranker: Option<&dyn Reranker>,
    config: &SignetConfig,
    req: RecallRequest,
) -> SignetResult<RecallOutcome> {
    let search_cfg = &config.search;
    let graph_cfg = &config.pipeline_v2.graph;
    let reranker_cfg = &config.pipeline_v2.reranker;
    let guardrails = &config.pipeline_v2.guardrails;

    // Step 1: keyword pass.
    let query = req.query.clone();
    let filters = req.filters.clone();
    let top_k = search_cfg.top_k;
    let keyword_rows = accessor.with_read_db(|conn| memory_search::search_fts(conn, &query, &filters, top_k))?;

    // Step 2: vector pass, time-bounded and best-effort.
    let vector_rows = match embeddings.embed(&req.query).await {
        Some(query_vector) => {
            let memory_type = req.filters.memory_type.clone();
            accessor.with_read_db(|conn| vector_search::search_vector(conn, &query_vector, top_k, memory_type.as_deref()))?
        }
        None => Vec::new(),
    };

    // Step 3: fuse.
    let mut candidates: Vec<Candidate> = fuse(keyword_rows, vector_rows, search_cfg.alpha, search_cfg.min_score);

    // Step 4: rehearsal boost.
    if search_cfg.rehearsal_enabled {
        apply_rehearsal_boost(&mut candidates, search_cfg.rehearsal_weight, search_cfg.rehearsal_half_life_days);
    }

    // Step 5: graph boost.
    if graph_cfg.enabled {
        let deadline = Instant::now() + Duration::from_millis(graph_cfg.boost_timeout_ms.max(0) as u64);
        let query = req.query.clone();
        let weight = graph_cfg.boost_weight;
        accessor.with_read_db(|conn| apply_graph_boost(conn, &mut candidates, &query, weight, deadline))?;
    }

    // Step 6: reranker.
    if reranker_cfg.enabled {
        if let Some(r) = reranker {
            apply_reranker(r, &req.query, &mut candidates, reranker_cfg.top_n);
        }
    }

    // Step 7: truncate & shape.
    candidates.truncate(req.limit);
    let vector_used = candidates.iter().any(|c| c.source != RecallSource::Keyword);
    let mut results: Vec<RecallItem> = candidates
        .into_iter()
        .map(|c| shape(c, guardrails.recall_truncate_chars))
        .collect();

    // Step 8: access bump. Never fails the query.
    let ids: Vec<String> = results.iter().map(|r| r.memory_id.clone()).collect();
    if let Err(e) = accessor.with_write_tx(|conn| tx::finalize_access(conn, &ids, Utc::now())) {
        tracing::warn!(error = %e, "failed to bump access counters after recall");
    }

    // Step 9: decision -> rationale linking.
    if graph_cfg.enabled {
        let supplementary = accessor.with_read_db(|conn| link_decision_rationales(conn, &results))?;
        for memory in supplementary {
            results.push(RecallItem {
                memory_id: memory.id,
                content: memory.content,
                content_length: 0,
                truncated: false,
                score: 0.0,
                source: "keyword",
                memory_type: memory.memory_type.as_str().to_string(),
                tags: memory.tags,
                pinned: memory.pinned,
                importance: memory.importance,
                who: memory.who,
                project: memory.project,
                created_at: memory.created_at,
                supplementary: true,
            });
        }
    }

    let method = if vector_used { "hybrid" } else { "keyword" };
    Ok(RecallOutcome { results, method })
}

fn shape(c: Candidate, truncate_chars: usize) -> RecallItem {
    let content_length = c.memory.content.chars().count();
    let (content, truncated) = if content_length > truncate_chars {
        let truncated_body: String = c.memory.content.chars().take(truncate_chars).collect();
        (format!("{truncated_body}{TRUNCATION_SENTINEL}"), true)
    } else {
        (c.memory.content.clone(), false)
    };
    RecallItem {
        memory_id: c.memory.id,
        content,
        content_length,
        truncated,
        score: (c.score * 100.0).round() / 100.0,
        source: c.source.as_str(),
        memory_type: c.memory.memory_type.as_str().to_string(),
        tags: c.memory.tags,
        pinned: c.memory.pinned,
        importance: c.memory.importance,
        who: c.memory.who,
        project: c.memory.project,
        created_at: c.memory.created_at,
        supplementary: false,
    }
}
