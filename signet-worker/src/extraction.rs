//! The extraction worker (spec §4.H): claim a lease, call the provider
//! outside any transaction, then apply the resulting facts inside one
//! write transaction. Runs as a cooperative `worker.pollMs` loop.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_core::history::{ActorType, MutationContext};
use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
use signet_core::traits::{ExtractedFact, ExtractedRelationship, ExtractionProvider};
use signet_storage::queries::{jobs, memory_crud};
use signet_storage::tx;
use signet_storage::Accessor;

#[derive(Debug, Clone, Default)]
pub struct ExtractionCycleOutcome {
    pub claimed: bool,
    pub applied: usize,
    pub went_dead: bool,
}

fn fact_to_memory(fact: &ExtractedFact, source_memory_id: &str, now: chrono::DateTime<Utc>) -> Memory {
    let normalized = normalize_content(&fact.content);
    let hash = content_hash(&normalized);
    Memory {
        id: uuid::Uuid::new_v4().to_string(),
        content: fact.content.clone(),
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
        source_type: Some("extraction".to_string()),
        source_id: Some(source_memory_id.to_string()),
        embedding_model: None,
        extraction_status: ExtractionStatus::None,
        extraction_model: None,
    }
}

/// Run exactly one claim/process cycle. Returns `Ok(outcome)` with
/// `claimed = false` when there was nothing to do — that is the
/// expected steady state, not an error.
pub async fn run_extraction_cycle(
    accessor: &Accessor,
    provider: &dyn ExtractionProvider,
    config: &SignetConfig,
) -> SignetResult<ExtractionCycleOutcome> {
    let worker_cfg = &config.pipeline_v2.worker;

    let job = accessor.with_write_tx(|conn| jobs::claim_next_job(conn, worker_cfg.lease_timeout_ms, Utc::now()))?;
    let Some(job) = job else {
        return Ok(ExtractionCycleOutcome::default());
    };

    let Some(memory) = accessor.with_read_db(|conn| memory_crud::get_memory(conn, &job.memory_id))? else {
        accessor.with_write_tx(|conn| jobs::mark_done(conn, &job.id, Utc::now()))?;
        return Ok(ExtractionCycleOutcome {
            claimed: true,
            ..Default::default()
        });
    };

    let timeout = Duration::from_millis(config.pipeline_v2.extraction.timeout_ms.max(0) as u64);
    let facts = match tokio::time::timeout(timeout, provider.extract(&memory.content)).await {
        Ok(Ok(facts)) => facts,
        Ok(Err(reason)) => {
            tracing::warn!(job_id = %job.id, memory_id = %job.memory_id, reason, "extraction call failed");
            let went_dead = accessor.with_write_tx(|conn| jobs::record_failure(conn, &job.id, worker_cfg.max_retries, Utc::now()))?;
            return Ok(ExtractionCycleOutcome {
                claimed: true,
                applied: 0,
                went_dead,
            });
        }
        Err(_elapsed) => {
            tracing::warn!(job_id = %job.id, memory_id = %job.memory_id, "extraction call timed out");
            let went_dead = accessor.with_write_tx(|conn| jobs::record_failure(conn, &job.id, worker_cfg.max_retries, Utc::now()))?;
            return Ok(ExtractionCycleOutcome {
                claimed: true,
                applied: 0,
                went_dead,
            });
        }
    };

    if config.pipeline_v2.mutations_frozen {
        tracing::info!(job_id = %job.id, "mutationsFrozen, completing job without writes");
        accessor.with_write_tx(|conn| jobs::mark_done(conn, &job.id, Utc::now()))?;
        return Ok(ExtractionCycleOutcome {
            claimed: true,
            ..Default::default()
        });
    }

    let min_confidence = config.pipeline_v2.extraction.min_confidence;
    let high_confidence: Vec<ExtractedFact> = facts.into_iter().filter(|f| f.confidence >= min_confidence).collect();

    if config.pipeline_v2.shadow_mode {
        tracing::info!(job_id = %job.id, proposed = high_confidence.len(), "shadow mode, logging decisions only");
        accessor.with_write_tx(|conn| jobs::mark_done(conn, &job.id, Utc::now()))?;
        return Ok(ExtractionCycleOutcome {
            claimed: true,
            applied: 0,
            went_dead: false,
        });
    }

    let ctx = MutationContext::new(ActorType::Pipeline);
    let source_memory_id = job.memory_id.clone();
    let model = config.pipeline_v2.extraction.model.clone();
    let applied = accessor.with_write_tx(|conn| {
        let mut applied = 0usize;
        for fact in &high_confidence {
            let now = Utc::now();
            match &fact.relationship {
                None => {
                    let candidate = fact_to_memory(fact, &source_memory_id, now);
                    let new_id = candidate.id.clone();
                    if let tx::IngestOutcome::Inserted(_) = tx::ingest(conn, candidate, &ctx, now)? {
                        tx::record_entity_mentions(conn, &new_id, &fact.entities, "extracted")?;
                        applied += 1;
                    }
                }
                Some(rel) => {
                    let decision = match rel {
                        ExtractedRelationship::Update { target_memory_id } => tx::ExtractedDecision::Update {
                            target_memory_id: target_memory_id.clone(),
                            new_content: fact.content.clone(),
                        },
                        ExtractedRelationship::Delete { target_memory_id } => tx::ExtractedDecision::Delete {
                            target_memory_id: target_memory_id.clone(),
                        },
                        ExtractedRelationship::Merge { target_memory_id } => tx::ExtractedDecision::Merge {
                            source_memory_id: source_memory_id.clone(),
                            target_memory_id: target_memory_id.clone(),
                            merged_content: fact.content.clone(),
                        },
                    };
                    if tx::apply_decision(conn, decision, &ctx, now)? == tx::ApplyDecisionOutcome::Applied {
                        applied += 1;
                        if let ExtractedRelationship::Update { target_memory_id } | ExtractedRelationship::Merge { target_memory_id } = rel {
                            tx::record_entity_mentions(conn, target_memory_id, &fact.entities, "extracted")?;
                        }
                    }
                }
            }
        }
        memory_crud::set_extraction_status(conn, &source_memory_id, ExtractionStatus::Done, Some(&model))?;
        jobs::mark_done(conn, &job.id, Utc::now())?;
        Ok(applied)
    })?;

    Ok(ExtractionCycleOutcome {
        claimed: true,
        applied,
        went_dead: false,
    })
}

/// Run the cooperative poll loop until `shutdown` signals true. Each
/// cycle resolves before the next `poll_ms` sleep begins — a
/// setTimeout-chain, not a fixed-rate interval, so a slow extraction
/// call never causes overlapping cycles.
pub async fn run_extraction_worker(
    accessor: std::sync::Arc<Accessor>,
    provider: std::sync::Arc<dyn ExtractionProvider>,
    config: SignetConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match run_extraction_cycle(&accessor, provider.as_ref(), &config).await {
            Ok(outcome) if outcome.claimed => {
                tracing::debug!(applied = outcome.applied, went_dead = outcome.went_dead, "extraction cycle completed");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "extraction cycle failed"),
        }

        let sleep = tokio::time::sleep(Duration::from_millis(config.pipeline_v2.worker.poll_ms.max(0) as u64));
        tokio::select! {
            _ = sleep => {}
            changed = shutdown.changed() => {
                if changed.is_ok() && *shutdown.borrow() {
                    break;
                }
            }
        }
        if *shutdown.borrow() {
            break;
        }
    }
    tracing::info!("extraction worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use signet_core::history::MutationContext;
    use signet_core::memory::ExtractionStatus;

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

    struct FakeProvider(Vec<ExtractedFact>);

    #[async_trait]
    impl ExtractionProvider for FakeProvider {
        async fn extract(&self, _memory_content: &str) -> Result<Vec<ExtractedFact>, String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn high_confidence_fact_becomes_a_new_memory_and_job_completes() {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Agent);
        let source = sample_memory("m1", "we decided to use postgres");
        accessor.with_write_tx(|conn| tx::ingest(conn, source, &ctx, Utc::now())).unwrap();
        accessor.with_write_tx(|conn| jobs::enqueue_extraction(conn, "m1", Utc::now())).unwrap();

        let provider = FakeProvider(vec![ExtractedFact {
            content: "database is postgres".into(),
            confidence: 0.9,
            relationship: None,
            entities: vec!["postgres".into()],
        }]);
        let config = SignetConfig::default();

        let outcome = run_extraction_cycle(&accessor, &provider, &config).await.unwrap();
        assert!(outcome.claimed);
        assert_eq!(outcome.applied, 1);

        let source = accessor.with_read_db(|conn| memory_crud::get_memory(conn, "m1")).unwrap().unwrap();
        assert_eq!(source.extraction_status, ExtractionStatus::Done);
    }

    #[tokio::test]
    async fn low_confidence_facts_are_dropped() {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Agent);
        let source = sample_memory("m1", "maybe we'll use postgres");
        accessor.with_write_tx(|conn| tx::ingest(conn, source, &ctx, Utc::now())).unwrap();
        accessor.with_write_tx(|conn| jobs::enqueue_extraction(conn, "m1", Utc::now())).unwrap();

        let provider = FakeProvider(vec![ExtractedFact {
            content: "database is postgres".into(),
            confidence: 0.1,
            relationship: None,
            entities: vec![],
        }]);
        let config = SignetConfig::default();

        let outcome = run_extraction_cycle(&accessor, &provider, &config).await.unwrap();
        assert_eq!(outcome.applied, 0);
    }

    #[tokio::test]
    async fn no_pending_jobs_is_a_no_op() {
        let accessor = Accessor::init_in_memory().unwrap();
        let provider = FakeProvider(vec![]);
        let config = SignetConfig::default();
        let outcome = run_extraction_cycle(&accessor, &provider, &config).await.unwrap();
        assert!(!outcome.claimed);
    }
}
