//! The named-action registry (spec §4.J): policy + rate-limit gate,
//! then the mechanical action, then a synthetic history event.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::errors::{RepairError, SignetResult};
use signet_core::history::ActorType;
use signet_core::traits::EmbeddingProvider;
use signet_storage::queries::history;
use signet_storage::Accessor;

use crate::policy::{policy_gate, GateDenial, RateLimiter};

/// Everything an action needs to run. Built fresh per request by the
/// caller (the HTTP layer or the daemon's own maintenance loop).
pub struct RepairContext {
    pub accessor: Arc<Accessor>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub config: SignetConfig,
    pub actor: String,
    pub actor_type: ActorType,
    pub reason: String,
    pub dry_run: bool,
    pub max_batch: Option<usize>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RepairOutcome {
    pub action: String,
    pub success: bool,
    pub affected: usize,
    pub message: String,
}

#[async_trait]
pub trait RepairAction: Send + Sync {
    fn name(&self) -> &'static str;
    /// The `{cooldown_ms, hourly_budget}` pair this action is gated by.
    fn rate_limit(&self, cfg: &SignetConfig) -> (i64, u32);
    async fn run(&self, ctx: &RepairContext) -> SignetResult<RepairOutcome>;
}

pub struct RepairRegistry {
    actions: HashMap<&'static str, Box<dyn RepairAction>>,
    limiter: RateLimiter,
}

impl RepairRegistry {
    pub fn new() -> Self {
        let mut actions: HashMap<&'static str, Box<dyn RepairAction>> = HashMap::new();
        for action in crate::actions::all() {
            actions.insert(action.name(), action);
        }
        Self {
            actions,
            limiter: RateLimiter::new(),
        }
    }

    pub async fn run(&self, action_name: &str, ctx: RepairContext) -> SignetResult<RepairOutcome> {
        let Some(action) = self.actions.get(action_name) else {
            return Err(RepairError::UnknownAction { name: action_name.to_string() }.into());
        };

        if let Err(denial) = policy_gate(ctx.actor_type, &ctx.config.pipeline_v2.autonomous) {
            return Ok(RepairOutcome {
                action: action_name.to_string(),
                success: false,
                affected: 0,
                message: format!("denied by policy gate: {denial:?}"),
            });
        }

        let (cooldown_ms, hourly_budget) = action.rate_limit(&ctx.config);
        if let Err(denial) = self.limiter.check_and_record(action.name(), cooldown_ms, hourly_budget, Utc::now()) {
            let message = match denial {
                GateDenial::Cooldown => "cooldown active".to_string(),
                GateDenial::BudgetExhausted => "hourly budget exhausted".to_string(),
                other => format!("denied by rate limit: {other:?}"),
            };
            return Ok(RepairOutcome {
                action: action_name.to_string(),
                success: false,
                affected: 0,
                message,
            });
        }

        let outcome = action.run(&ctx).await?;

        if outcome.success && outcome.affected > 0 {
            let accessor = ctx.accessor.clone();
            let action_owned = outcome.action.clone();
            let actor = ctx.actor.clone();
            let reason = ctx.reason.clone();
            let affected = outcome.affected;
            if let Err(e) = accessor.with_write_tx(|conn| history::record_system_event(conn, &action_owned, affected, &actor, &reason, Utc::now())) {
                tracing::warn!(action = %outcome.action, error = %e, "failed to record repair history event");
            }
        }

        Ok(outcome)
    }
}

impl Default for RepairRegistry {
    fn default() -> Self {
        Self::new()
    }
}
