//! Exercises the repair registry end to end: policy gate, rate limit,
//! and a couple of the mechanical actions themselves.

use std::sync::Arc;

use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
use signet_embeddings::noop::NoopProvider;
use signet_repair::{RepairContext, RepairRegistry};
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

fn context(accessor: Arc<Accessor>, config: SignetConfig) -> RepairContext {
    RepairContext {
        accessor,
        embeddings: Arc::new(NoopProvider::new(8)),
        config,
        actor: "tester".to_string(),
        actor_type: ActorType::Operator,
        reason: "integration test".to_string(),
        dry_run: false,
        max_batch: None,
    }
}

#[tokio::test]
async fn frozen_autonomous_denies_the_action_without_running_it() {
    let accessor = Accessor::init_in_memory().unwrap();
    let mut config = SignetConfig::default();
    config.pipeline_v2.autonomous.frozen = true;
    let registry = RepairRegistry::new();

    let outcome = registry.run("requeueDeadJobs", context(accessor, config)).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.contains("Frozen"));
}

#[tokio::test]
async fn unknown_action_is_an_error() {
    let accessor = Accessor::init_in_memory().unwrap();
    let registry = RepairRegistry::new();
    let result = registry.run("notARealAction", context(accessor, SignetConfig::default())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn release_stale_leases_moves_an_expired_lease_back_to_pending() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Agent);
    accessor
        .with_write_tx(|conn| tx::ingest(conn, sample_memory("m1", "rotate keys"), &ctx, Utc::now()))
        .unwrap();

    let long_ago = Utc::now() - chrono::Duration::hours(2);
    accessor
        .with_write_tx(|conn| signet_storage::queries::jobs::enqueue_extraction(conn, "m1", long_ago))
        .unwrap();
    accessor
        .with_write_tx(|conn| signet_storage::queries::jobs::claim_next_job(conn, 60_000, long_ago))
        .unwrap();

    let mut config = SignetConfig::default();
    config.pipeline_v2.worker.lease_timeout_ms = 1_000;
    let registry = RepairRegistry::new();

    let outcome = registry.run("releaseStaleLeases", context(accessor, config)).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.affected, 1);
}

#[tokio::test]
async fn rate_limit_blocks_a_second_call_within_the_cooldown() {
    let accessor = Accessor::init_in_memory().unwrap();
    let mut config = SignetConfig::default();
    config.pipeline_v2.repair.requeue_cooldown_ms = 60_000;
    let registry = RepairRegistry::new();

    let first = registry.run("requeueDeadJobs", context(accessor.clone(), config.clone())).await.unwrap();
    assert!(first.success);
    let second = registry.run("requeueDeadJobs", context(accessor, config)).await.unwrap();
    assert!(!second.success);
    assert!(second.message.contains("cooldown active"));
}

#[tokio::test]
async fn fts_consistency_reports_no_mismatch_on_a_fresh_store() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Agent);
    accessor
        .with_write_tx(|conn| tx::ingest(conn, sample_memory("m1", "rotate keys"), &ctx, Utc::now()))
        .unwrap();

    let registry = RepairRegistry::new();
    let outcome = registry.run("checkFtsConsistency", context(accessor, SignetConfig::default())).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.affected, 0);
    assert!(outcome.message.contains("mismatched=false"));
}
