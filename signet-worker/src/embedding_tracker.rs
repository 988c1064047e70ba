//! The embedding tracker (spec §4.I): a self-scheduling backfill loop
//! with natural backpressure — each cycle probes the provider, reads a
//! batch of stale/missing rows, fetches vectors outside any
//! transaction, then writes the whole batch in one transaction.

use std::time::Duration;

use tokio::sync::watch;

use signet_core::errors::SignetResult;
use signet_core::traits::EmbeddingProvider;
use signet_storage::queries::vector_search;
use signet_storage::Accessor;

const BACKFILL_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct EmbeddingCycleOutcome {
    pub scanned: usize,
    pub embedded: usize,
    pub provider_unavailable: bool,
}

/// Run one tracker cycle. Cycle errors (reported via `Err`) are logged
/// by the caller and never stop the loop.
pub async fn run_embedding_cycle(accessor: &Accessor, provider: &dyn EmbeddingProvider) -> SignetResult<EmbeddingCycleOutcome> {
    let status = provider.available().await;
    if !status.available {
        return Ok(EmbeddingCycleOutcome {
            provider_unavailable: true,
            ..Default::default()
        });
    }

    let model = provider.model_name().to_string();
    let stale = accessor.with_read_db(|conn| vector_search::find_stale_or_missing_embeddings(conn, &model, BACKFILL_BATCH_SIZE))?;
    if stale.is_empty() {
        return Ok(EmbeddingCycleOutcome::default());
    }

    let mut fetched = Vec::with_capacity(stale.len());
    for memory in &stale {
        if let Some(vector) = provider.embed(&memory.content).await {
            fetched.push((memory.id.clone(), memory.content_hash.clone(), vector));
        }
    }

    let embedded = fetched.len();
    let model_name = model.clone();
    accessor.with_write_tx(|conn| {
        for (memory_id, content_hash, vector) in &fetched {
            let embedding_id = uuid::Uuid::new_v4().to_string();
            vector_search::upsert_embedding(conn, &embedding_id, memory_id, content_hash, vector, &model_name)?;
        }
        Ok(())
    })?;

    Ok(EmbeddingCycleOutcome {
        scanned: stale.len(),
        embedded,
        provider_unavailable: false,
    })
}

/// Self-scheduling poll loop: sleep after each cycle rather than on a
/// fixed interval, so a slow provider naturally throttles the scan rate.
pub async fn run_embedding_tracker(
    accessor: std::sync::Arc<Accessor>,
    provider: std::sync::Arc<dyn EmbeddingProvider>,
    poll_ms: i64,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match run_embedding_cycle(&accessor, provider.as_ref()).await {
            Ok(outcome) if outcome.embedded > 0 || outcome.scanned > 0 => {
                tracing::info!(scanned = outcome.scanned, embedded = outcome.embedded, "embedding tracker cycle");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "embedding tracker cycle failed"),
        }

        let sleep = tokio::time::sleep(Duration::from_millis(poll_ms.max(0) as u64));
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
    tracing::info!("embedding tracker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use signet_core::history::{ActorType, MutationContext};
    use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
    use signet_core::traits::ProviderAvailability;
    use signet_storage::tx;

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

    struct FakeProvider {
        available: bool,
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
            Some(self.vector.clone())
        }
        async fn available(&self) -> ProviderAvailability {
            ProviderAvailability {
                available: self.available,
                dimensions: Some(self.vector.len()),
                error: None,
            }
        }
        fn dimensions(&self) -> usize {
            self.vector.len()
        }
        fn model_name(&self) -> &str {
            "fake-model"
        }
    }

    #[tokio::test]
    async fn backfills_missing_embeddings_and_settles_on_a_dry_cycle() {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Agent);
        let memory = sample_memory("m1", "rotate keys weekly");
        accessor.with_write_tx(|conn| tx::ingest(conn, memory, &ctx, Utc::now())).unwrap();

        let provider = FakeProvider { available: true, vector: vec![0.1, 0.2, 0.3] };
        let first = run_embedding_cycle(&accessor, &provider).await.unwrap();
        assert_eq!(first.scanned, 1);
        assert_eq!(first.embedded, 1);

        let second = run_embedding_cycle(&accessor, &provider).await.unwrap();
        assert_eq!(second.scanned, 0);
    }

    #[tokio::test]
    async fn unavailable_provider_skips_the_cycle() {
        let accessor = Accessor::init_in_memory().unwrap();
        let provider = FakeProvider { available: false, vector: vec![0.1] };
        let outcome = run_embedding_cycle(&accessor, &provider).await.unwrap();
        assert!(outcome.provider_unavailable);
        assert_eq!(outcome.scanned, 0);
    }
}
