//! Graph boost and decision→rationale linking (spec §4.G steps 5 & 9).
//! Both degrade to a no-op when `graph.enabled` is false or the
//! timeout elapses before the DB round trip completes — a candidate
//! set search reusing the `entities`/`entity_mentions` join table is
//! not expensive enough to need true cancellation, so the timeout is
//! a simple elapsed-time check rather than a spawned, abortable task.

use std::time::Instant;

use rusqlite::Connection;
use signet_core::errors::SignetResult;
use signet_core::memory::Memory;
use signet_storage::queries::entities;

use crate::types::{Candidate, RecallItem};

/// Re-weight candidates whose memory is linked (via shared entities)
/// to the query's own terms. Bails out without boosting if `deadline`
/// has already passed by the time the entity lookup would run.
pub fn apply_graph_boost(
    conn: &Connection,
    candidates: &mut [Candidate],
    query: &str,
    weight: f64,
    deadline: Instant,
) -> SignetResult<()> {
    if Instant::now() >= deadline {
        return Ok(());
    }
    let terms: Vec<String> = query.split_whitespace().map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string()).filter(|t| !t.is_empty()).collect();
    let entity_ids = entities::entity_ids_matching_terms(conn, &terms)?;
    if entity_ids.is_empty() || Instant::now() >= deadline {
        return Ok(());
    }
    let linked_ids: std::collections::HashSet<String> = entities::memory_ids_mentioning_entities(conn, &entity_ids)?.into_iter().collect();

    for c in candidates.iter_mut() {
        if linked_ids.contains(&c.memory.id) {
            c.score = (1.0 - weight) * c.score + weight;
        }
    }
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(())
}

/// Append up to 10 rationale memories linked to the same entities as
/// any returned decision (spec §4.G step 9).
pub fn link_decision_rationales(conn: &Connection, results: &[RecallItem]) -> SignetResult<Vec<Memory>> {
    let decision_ids: Vec<String> = results.iter().filter(|r| r.memory_type == "decision").map(|r| r.memory_id.clone()).collect();
    if decision_ids.is_empty() {
        return Ok(Vec::new());
    }
    let entity_ids = entities::entity_ids_for_memories(conn, &decision_ids)?;
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let exclude: Vec<String> = results.iter().map(|r| r.memory_id.clone()).collect();
    entities::memories_mentioning_entities(conn, &entity_ids, "rationale", &exclude, 10)
}
