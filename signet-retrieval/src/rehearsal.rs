//! Rehearsal boost: frequently and recently accessed memories rank
//! higher (spec §4.G step 4).

use chrono::Utc;

use crate::types::Candidate;

pub fn apply_rehearsal_boost(candidates: &mut [Candidate], weight: f64, half_life_days: f64) {
    let now = Utc::now();
    for c in candidates.iter_mut() {
        let days_since_access = c
            .memory
            .last_accessed
            .map(|t| (now - t).num_seconds() as f64 / 86_400.0)
            .unwrap_or(f64::INFINITY);
        let recency = 0.5f64.powf(days_since_access / half_life_days);
        let boost = weight * ((c.memory.access_count as f64 + 1.0).ln()) * recency;
        c.score *= 1.0 + boost;
    }
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use signet_core::memory::{ExtractionStatus, MemoryKind};
    use signet_core::memory::Memory;
    use crate::types::RecallSource;

    fn sample(access_count: u64, last_accessed: Option<chrono::DateTime<Utc>>) -> Candidate {
        let now = Utc::now();
        Candidate {
            memory: Memory {
                id: "m".into(),
                content: "x".into(),
                normalized_content: "x".into(),
                content_hash: "h".into(),
                memory_type: MemoryKind::Fact,
                tags: vec![],
                importance: 0.5,
                pinned: false,
                is_deleted: false,
                deleted_at: None,
                version: 1,
                access_count,
                last_accessed,
                who: None,
                why: None,
                project: None,
                created_at: now,
                updated_at: now,
                updated_by: None,
                source_type: None,
                source_id: None,
                embedding_model: None,
                extraction_status: ExtractionStatus::None,
                extraction_model: None,
            },
            score: 0.5,
            source: RecallSource::Hybrid,
        }
    }

    #[test]
    fn never_accessed_memory_gets_no_boost() {
        let mut candidates = vec![sample(0, None)];
        apply_rehearsal_boost(&mut candidates, 0.1, 14.0);
        assert!((candidates[0].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recently_and_frequently_accessed_memory_is_boosted_above_baseline() {
        let mut candidates = vec![sample(10, Some(Utc::now() - Duration::hours(1)))];
        apply_rehearsal_boost(&mut candidates, 0.1, 14.0);
        assert!(candidates[0].score > 0.5);
    }
}
