//! Policy and rate-limit gates shared by every registered action
//! (spec §4.J). Grounded in the teacher's split between a scheduling
//! policy (trigger evaluation, throttling) and the mechanical action it
//! gates, generalized from consolidation scheduling to repair actions.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use signet_core::config::AutonomousConfig;
use signet_core::history::ActorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDenial {
    Frozen,
    AgentNotEnabled,
    Cooldown,
    BudgetExhausted,
}

/// Denied if `autonomous.frozen`; denied for an `agent` actor when
/// `autonomous.enabled = false`; operator actors bypass the enabled
/// check but never the frozen check.
pub fn policy_gate(actor_type: ActorType, cfg: &AutonomousConfig) -> Result<(), GateDenial> {
    if cfg.frozen {
        return Err(GateDenial::Frozen);
    }
    if actor_type == ActorType::Agent && !cfg.enabled {
        return Err(GateDenial::AgentNotEnabled);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub last_run_at: Option<DateTime<Utc>>,
    pub hourly_count: u32,
    pub hour_reset_at: DateTime<Utc>,
}

impl RateLimitState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            last_run_at: None,
            hourly_count: 0,
            hour_reset_at: now + chrono::Duration::hours(1),
        }
    }
}

/// Per-action-name rate limiter state, held by the registry for its
/// lifetime — a process-wide map of mutable counters, same shape as
/// the teacher's rate-limiter-map Design Note.
#[derive(Default)]
pub struct RateLimiter {
    states: DashMap<&'static str, RateLimitState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the gate and, only on success, record this run. Fails
    /// when within `cooldown_ms` of the last run, or when the hourly
    /// budget for this action is already spent.
    pub fn check_and_record(&self, action: &'static str, cooldown_ms: i64, hourly_budget: u32, now: DateTime<Utc>) -> Result<(), GateDenial> {
        let mut entry = self.states.entry(action).or_insert_with(|| RateLimitState::fresh(now));

        if now >= entry.hour_reset_at {
            entry.hourly_count = 0;
            entry.hour_reset_at = now + chrono::Duration::hours(1);
        }

        if let Some(last) = entry.last_run_at {
            if (now - last).num_milliseconds() < cooldown_ms {
                return Err(GateDenial::Cooldown);
            }
        }
        if entry.hourly_count >= hourly_budget {
            return Err(GateDenial::BudgetExhausted);
        }

        entry.last_run_at = Some(now);
        entry.hourly_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_denies_every_actor() {
        let cfg = AutonomousConfig {
            enabled: true,
            frozen: true,
            allow_update_delete: false,
            maintenance_interval_ms: 1000,
            maintenance_mode: signet_core::config::MaintenanceMode::Observe,
        };
        assert_eq!(policy_gate(ActorType::Operator, &cfg), Err(GateDenial::Frozen));
        assert_eq!(policy_gate(ActorType::Agent, &cfg), Err(GateDenial::Frozen));
    }

    #[test]
    fn disabled_autonomous_only_blocks_agents() {
        let cfg = AutonomousConfig {
            enabled: false,
            frozen: false,
            allow_update_delete: false,
            maintenance_interval_ms: 1000,
            maintenance_mode: signet_core::config::MaintenanceMode::Observe,
        };
        assert_eq!(policy_gate(ActorType::Agent, &cfg), Err(GateDenial::AgentNotEnabled));
        assert!(policy_gate(ActorType::Operator, &cfg).is_ok());
    }

    #[test]
    fn rate_limiter_blocks_within_cooldown_and_recovers_after() {
        let limiter = RateLimiter::new();
        let t0 = Utc::now();
        assert!(limiter.check_and_record("requeueDeadJobs", 1000, 10, t0).is_ok());
        assert_eq!(limiter.check_and_record("requeueDeadJobs", 1000, 10, t0), Err(GateDenial::Cooldown));
        let later = t0 + chrono::Duration::milliseconds(1001);
        assert!(limiter.check_and_record("requeueDeadJobs", 1000, 10, later).is_ok());
    }

    #[test]
    fn rate_limiter_enforces_hourly_budget() {
        let limiter = RateLimiter::new();
        let t0 = Utc::now();
        for i in 0..3 {
            let t = t0 + chrono::Duration::seconds(i * 10);
            assert!(limiter.check_and_record("reembedMissingMemories", 0, 3, t).is_ok());
        }
        let t = t0 + chrono::Duration::seconds(31);
        assert_eq!(limiter.check_and_record("reembedMissingMemories", 0, 3, t), Err(GateDenial::BudgetExhausted));
    }
}
