//! Keyword/vector score fusion (spec §4.G steps 1-3).

use std::collections::HashMap;

use signet_core::memory::Memory;

use crate::types::{Candidate, RecallSource};

/// Min-max normalize `|score|` into `[0, 1]` within the batch, higher
/// is better. Raw FTS5 `bm25()` values are smaller-is-better, so the
/// direction is flipped here before fusion ever sees the numbers.
pub fn normalize_bm25(rows: &[(Memory, f64)]) -> HashMap<String, f64> {
    if rows.is_empty() {
        return HashMap::new();
    }
    let abs_scores: Vec<f64> = rows.iter().map(|(_, s)| s.abs()).collect();
    let min = abs_scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = abs_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    rows.iter()
        .map(|(m, s)| {
            let norm = if (max - min).abs() < f64::EPSILON {
                1.0
            } else {
                1.0 - (s.abs() - min) / (max - min)
            };
            (m.id.clone(), norm)
        })
        .collect()
}

/// Fuse the keyword and vector passes: `score = alpha*vec + (1-alpha)*bm25`
/// where both exist, otherwise whichever pass found the candidate.
/// Candidates below `min_score` are dropped (spec §4.G step 3).
pub fn fuse(
    keyword_rows: Vec<(Memory, f64)>,
    vector_rows: Vec<(Memory, f64)>,
    alpha: f64,
    min_score: f64,
) -> Vec<Candidate> {
    let bm25_norm = normalize_bm25(&keyword_rows);
    let mut memories: HashMap<String, Memory> = HashMap::new();
    let mut vector_scores: HashMap<String, f64> = HashMap::new();

    for (m, _) in &keyword_rows {
        memories.entry(m.id.clone()).or_insert_with(|| m.clone());
    }
    for (m, score) in vector_rows {
        vector_scores.insert(m.id.clone(), score);
        memories.entry(m.id.clone()).or_insert(m);
    }

    let mut out = Vec::new();
    for (id, memory) in memories {
        let bm25 = bm25_norm.get(&id).copied();
        let vec = vector_scores.get(&id).copied();
        let (score, source) = match (vec, bm25) {
            (Some(v), Some(b)) => (alpha * v + (1.0 - alpha) * b, RecallSource::Hybrid),
            (Some(v), None) => (v, RecallSource::Vector),
            (None, Some(b)) => (b, RecallSource::Keyword),
            (None, None) => continue,
        };
        if score < min_score {
            continue;
        }
        out.push(Candidate { memory, score, source });
    }

    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use signet_core::memory::{ExtractionStatus, MemoryKind};

    fn sample(id: &str) -> Memory {
        let now = Utc::now();
        Memory {
            id: id.to_string(),
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
            access_count: 0,
            last_accessed: None,
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
        }
    }

    #[test]
    fn hybrid_candidates_blend_by_alpha() {
        let keyword = vec![(sample("a"), -2.0)];
        let vector = vec![(sample("a"), 0.8)];
        let fused = fuse(keyword, vector, 0.5, 0.0);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].source, RecallSource::Hybrid);
        // bm25_norm for the lone row is 1.0 (max == min branch), so score = 0.5*0.8 + 0.5*1.0
        assert!((fused[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn vector_only_candidate_keeps_raw_cosine() {
        let fused = fuse(vec![], vec![(sample("b"), 0.42)], 0.5, 0.0);
        assert_eq!(fused[0].source, RecallSource::Vector);
        assert!((fused[0].score - 0.42).abs() < 1e-9);
    }

    #[test]
    fn below_min_score_is_dropped() {
        let fused = fuse(vec![], vec![(sample("c"), 0.01)], 0.5, 0.05);
        assert!(fused.is_empty());
    }
}
