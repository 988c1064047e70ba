use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
use signet_embeddings::noop::NoopProvider;
use signet_session::SessionManager;
use signet_session::manager::SessionHooks;
use signet_storage::{tx, Accessor};

fn sample_memory(id: &str, content: &str) -> Memory {
    let now = Utc::now();
    let normalized = normalize_content(content);
    let hash = content_hash(&normalized);
    Memory {
        id: id.to_string(),
        content: content.to_string(),
        normalized_content: normalized,
        content_hash: hash,
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

#[tokio::test]
async fn session_start_records_candidates_and_checkpoints_on_prompt_count() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Agent);
    accessor
        .with_write_tx(|conn| tx::ingest(conn, sample_memory("m1", "rotate the signing keys monthly"), &ctx, Utc::now()))
        .unwrap();

    let embeddings = NoopProvider::new(8);
    let mut config = SignetConfig::default();
    config.continuity.prompt_interval = 2;
    let manager = SessionManager::new();
    let hooks = SessionHooks {
        accessor: &accessor,
        embeddings: &embeddings,
        reranker: None,
        config: &config,
    };

    let outcome = manager.handle_session_start(&hooks, Some("sess-1"), "signing keys").await.unwrap();
    assert!(outcome.inject);
    assert_eq!(outcome.candidates.len(), 1);

    manager.record_prompt("sess-1", "what did we decide about keys?");
    assert!(!manager.should_checkpoint("sess-1", &config));
    manager.record_prompt("sess-1", "anything else?");
    assert!(manager.should_checkpoint("sess-1", &config));

    let snapshot = manager.consume_state("sess-1").unwrap();
    assert_eq!(snapshot.total_prompts, 2);
    assert_eq!(snapshot.recent_prompts.len(), 2);
    assert!(!manager.should_checkpoint("sess-1", &config));

    let ids = vec!["m1".to_string()];
    let hits = manager.track_fts_hits(&accessor, "sess-1", &ids).unwrap();
    assert_eq!(hits, 1);

    manager.clear_continuity("sess-1");
    assert!(manager.consume_state("sess-1").is_none());
}

#[tokio::test]
async fn session_start_without_a_session_key_records_nothing() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Agent);
    accessor
        .with_write_tx(|conn| tx::ingest(conn, sample_memory("m1", "rotate the signing keys monthly"), &ctx, Utc::now()))
        .unwrap();

    let embeddings = NoopProvider::new(8);
    let config = SignetConfig::default();
    let manager = SessionManager::new();
    let hooks = SessionHooks {
        accessor: &accessor,
        embeddings: &embeddings,
        reranker: None,
        config: &config,
    };

    let outcome = manager.handle_session_start(&hooks, None, "signing keys").await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);

    let hits = manager.track_fts_hits(&accessor, "no-such-session", &["m1".to_string()]).unwrap();
    assert_eq!(hits, 0);
}
