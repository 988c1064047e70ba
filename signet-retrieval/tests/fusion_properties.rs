//! Property test for the hybrid fusion determinism invariant (spec §8):
//! given fixed BM25 and vector result sets, swapping `alpha` between 0
//! and 1 reproduces pure-keyword and pure-vector ordering respectively.

use chrono::Utc;
use proptest::prelude::*;

use signet_core::memory::{ExtractionStatus, Memory, MemoryKind};
use signet_retrieval::fuse::fuse;

fn memory(id: &str) -> Memory {
    let now = Utc::now();
    Memory {
        id: id.to_string(),
        content: "x".into(),
        normalized_content: "x".into(),
        content_hash: format!("hash-{id}"),
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

proptest! {
    #[test]
    fn alpha_zero_matches_pure_keyword_order(
        bm25_raw in prop::collection::vec(-10.0f64..-0.1, 3..8)
    ) {
        let keyword: Vec<(Memory, f64)> = bm25_raw
            .iter()
            .enumerate()
            .map(|(i, score)| (memory(&format!("m{i}")), *score))
            .collect();
        let vector: Vec<(Memory, f64)> = keyword
            .iter()
            .enumerate()
            .map(|(i, (m, _))| (m.clone(), 1.0 - (i as f64 / keyword.len() as f64)))
            .collect();

        let fused = fuse(keyword.clone(), vector, 0.0, 0.0);
        let keyword_only = fuse(keyword, vec![], 0.0, 0.0);

        let fused_order: Vec<String> = fused.iter().map(|c| c.memory.id.clone()).collect();
        let keyword_order: Vec<String> = keyword_only.iter().map(|c| c.memory.id.clone()).collect();
        prop_assert_eq!(fused_order, keyword_order);
    }

    #[test]
    fn alpha_one_matches_pure_vector_order(
        vector_scores in prop::collection::vec(0.01f64..1.0, 3..8)
    ) {
        let vector: Vec<(Memory, f64)> = vector_scores
            .iter()
            .enumerate()
            .map(|(i, score)| (memory(&format!("m{i}")), *score))
            .collect();
        let keyword: Vec<(Memory, f64)> = vector
            .iter()
            .enumerate()
            .map(|(i, (m, _))| (m.clone(), -1.0 - i as f64))
            .collect();

        let fused = fuse(keyword, vector.clone(), 1.0, 0.0);
        let vector_only = fuse(vec![], vector, 1.0, 0.0);

        let fused_order: Vec<String> = fused.iter().map(|c| c.memory.id.clone()).collect();
        let vector_order: Vec<String> = vector_only.iter().map(|c| c.memory.id.clone()).collect();
        prop_assert_eq!(fused_order, vector_order);
    }
}
