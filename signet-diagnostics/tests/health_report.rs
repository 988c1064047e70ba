use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
use signet_diagnostics::report::HealthReporter;
use signet_diagnostics::OverallStatus;
use signet_embeddings::noop::NoopProvider;
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
async fn an_empty_store_with_no_provider_is_still_healthy_overall() {
    let accessor = Accessor::init_in_memory().unwrap();
    let embeddings = NoopProvider::new(8);
    let config = SignetConfig::default();

    let report = HealthReporter::build(&accessor, &embeddings, &config).await.unwrap();
    assert_eq!(report.checks.len(), 7);
    assert_eq!(report.status, OverallStatus::Healthy);

    let reachability = report.checks.iter().find(|c| c.name == "provider_reachability").unwrap();
    assert_eq!(reachability.status, signet_diagnostics::CheckStatus::Warn);
}

#[tokio::test]
async fn active_memories_with_no_embeddings_report_low_coverage() {
    let accessor = Accessor::init_in_memory().unwrap();
    let ctx = MutationContext::new(ActorType::Agent);
    for i in 0..4 {
        accessor
            .with_write_tx(|conn| tx::ingest(conn, sample_memory(&format!("m{i}"), &format!("fact number {i}")), &ctx, Utc::now()))
            .unwrap();
    }

    let embeddings = NoopProvider::new(8);
    let config = SignetConfig::default();
    let report = HealthReporter::build(&accessor, &embeddings, &config).await.unwrap();

    let coverage = report.checks.iter().find(|c| c.name == "embedding_coverage").unwrap();
    assert_eq!(coverage.status, signet_diagnostics::CheckStatus::Fail);
}
