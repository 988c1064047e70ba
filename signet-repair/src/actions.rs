//! The five named repair actions (spec §4.J).

use async_trait::async_trait;
use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_storage::queries::{jobs, maintenance, memory_search, vector_search};

use signet_core::constants::FTS_MISMATCH_THRESHOLD;

use crate::registry::{RepairAction, RepairContext, RepairOutcome};

const DEFAULT_REQUEUE_BATCH: usize = 50;
const FTS_CHECK_COOLDOWN_MS: i64 = 60_000;
const FTS_CHECK_HOURLY_BUDGET: u32 = 10;
const RETENTION_SWEEP_COOLDOWN_MS: i64 = 60_000;
const RETENTION_SWEEP_HOURLY_BUDGET: u32 = 4;
const RETENTION_SWEEP_BATCH: usize = 200;

pub fn all() -> Vec<Box<dyn RepairAction>> {
    vec![
        Box::new(RequeueDeadJobs),
        Box::new(ReleaseStaleLeases),
        Box::new(CheckFtsConsistency),
        Box::new(TriggerRetentionSweep),
        Box::new(ReembedMissingMemories),
    ]
}

pub struct RequeueDeadJobs;

#[async_trait]
impl RepairAction for RequeueDeadJobs {
    fn name(&self) -> &'static str {
        "requeueDeadJobs"
    }
    fn rate_limit(&self, cfg: &SignetConfig) -> (i64, u32) {
        (cfg.pipeline_v2.repair.requeue_cooldown_ms, cfg.pipeline_v2.repair.requeue_hourly_budget)
    }
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome> {
        let max_batch = ctx.max_batch.unwrap_or(DEFAULT_REQUEUE_BATCH);
        if ctx.dry_run {
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 0,
                message: "dry run: no jobs requeued".to_string(),
            });
        }
        let affected = ctx.accessor.with_write_tx(|conn| jobs::requeue_dead_jobs(conn, max_batch, Utc::now()))?;
        Ok(RepairOutcome {
            action: self.name().to_string(),
            success: true,
            affected,
            message: format!("{affected} dead jobs requeued"),
        })
    }
}

pub struct ReleaseStaleLeases;

#[async_trait]
impl RepairAction for ReleaseStaleLeases {
    fn name(&self) -> &'static str {
        "releaseStaleLeases"
    }
    fn rate_limit(&self, cfg: &SignetConfig) -> (i64, u32) {
        (cfg.pipeline_v2.repair.requeue_cooldown_ms, cfg.pipeline_v2.repair.requeue_hourly_budget)
    }
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome> {
        if ctx.dry_run {
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 0,
                message: "dry run: no leases released".to_string(),
            });
        }
        let lease_timeout_ms = ctx.config.pipeline_v2.worker.lease_timeout_ms;
        let affected = ctx.accessor.with_write_tx(|conn| jobs::release_stale_leases(conn, lease_timeout_ms, Utc::now()))?;
        Ok(RepairOutcome {
            action: self.name().to_string(),
            success: true,
            affected,
            message: format!("{affected} stale leases released"),
        })
    }
}

pub struct CheckFtsConsistency;

#[async_trait]
impl RepairAction for CheckFtsConsistency {
    fn name(&self) -> &'static str {
        "checkFtsConsistency"
    }
    fn rate_limit(&self, _cfg: &SignetConfig) -> (i64, u32) {
        (FTS_CHECK_COOLDOWN_MS, FTS_CHECK_HOURLY_BUDGET)
    }
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome> {
        let (active, fts, ratio) = ctx.accessor.with_read_db(maintenance::fts_consistency)?;
        let mismatched = ratio > FTS_MISMATCH_THRESHOLD;

        if mismatched && !ctx.dry_run {
            ctx.accessor.with_write_tx(|conn| memory_search::rebuild_fts(conn))?;
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 1,
                message: format!("fts rebuilt: active={active} fts={fts} ratio={ratio:.3}"),
            });
        }

        Ok(RepairOutcome {
            action: self.name().to_string(),
            success: true,
            affected: 0,
            message: format!("active={active} fts={fts} ratio={ratio:.3} mismatched={mismatched}"),
        })
    }
}

pub struct TriggerRetentionSweep;

#[async_trait]
impl RepairAction for TriggerRetentionSweep {
    fn name(&self) -> &'static str {
        "triggerRetentionSweep"
    }
    fn rate_limit(&self, _cfg: &SignetConfig) -> (i64, u32) {
        (RETENTION_SWEEP_COOLDOWN_MS, RETENTION_SWEEP_HOURLY_BUDGET)
    }
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome> {
        if ctx.dry_run {
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 0,
                message: "dry run: no rows swept".to_string(),
            });
        }
        let window_ms = ctx.config.retention.window_ms;
        let batch = ctx.max_batch.unwrap_or(RETENTION_SWEEP_BATCH);
        let now = Utc::now();
        let affected = ctx.accessor.with_write_tx(|conn| maintenance::sweep_retention(conn, window_ms, now, batch))?;
        Ok(RepairOutcome {
            action: self.name().to_string(),
            success: true,
            affected,
            message: format!("{affected} expired rows hard-deleted"),
        })
    }
}

pub struct ReembedMissingMemories;

#[async_trait]
impl RepairAction for ReembedMissingMemories {
    fn name(&self) -> &'static str {
        "reembedMissingMemories"
    }
    fn rate_limit(&self, cfg: &SignetConfig) -> (i64, u32) {
        (cfg.pipeline_v2.repair.reembed_cooldown_ms, cfg.pipeline_v2.repair.reembed_hourly_budget)
    }
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome> {
        let batch_size = ctx.max_batch.unwrap_or(50);
        let model = ctx.embeddings.model_name().to_string();
        let stale = ctx.accessor.with_read_db(|conn| vector_search::find_stale_or_missing_embeddings(conn, &model, batch_size))?;
        if stale.is_empty() {
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 0,
                message: "no memories needed re-embedding".to_string(),
            });
        }

        if ctx.dry_run {
            return Ok(RepairOutcome {
                action: self.name().to_string(),
                success: true,
                affected: 0,
                message: format!("dry run: {} memories would be re-embedded", stale.len()),
            });
        }

        let mut fetched = Vec::with_capacity(stale.len());
        for memory in &stale {
            if let Some(vector) = ctx.embeddings.embed(&memory.content).await {
                fetched.push((memory.id.clone(), memory.content_hash.clone(), vector));
            }
        }

        let affected = fetched.len();
        ctx.accessor.with_write_tx(|conn| {
            for (memory_id, content_hash, vector) in &fetched {
                let embedding_id = uuid::Uuid::new_v4().to_string();
                vector_search::upsert_embedding(conn, &embedding_id, memory_id, content_hash, vector, &model)?;
            }
            Ok(())
        })?;

        Ok(RepairOutcome {
            action: self.name().to_string(),
            success: true,
            affected,
            message: format!("{affected} memories re-embedded"),
        })
    }
}
