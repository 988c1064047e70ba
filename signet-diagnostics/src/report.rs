//! Weighted aggregation of the 7 named checks into one score (spec
//! §4.M). Weights sum to 1; unlike the teacher's worst-of-N
//! `derive_overall`, a single failing check degrades the score rather
//! than forcing the whole report unhealthy.

use signet_core::config::SignetConfig;
use signet_core::constants::{HEALTH_SCORE_DEGRADED, HEALTH_SCORE_HEALTHY};
use signet_core::errors::SignetResult;
use signet_core::traits::EmbeddingProvider;
use signet_storage::Accessor;

use crate::checks::{self, CheckResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub checks: Vec<CheckResult>,
    pub score: f64,
    pub status: OverallStatus,
}

/// `(check name, weight)`. Weights sum to 1.0.
const WEIGHTS: &[(&str, f64)] = &[
    ("provider_reachability", 0.15),
    ("embedding_coverage", 0.15),
    ("dimension_mismatch", 0.15),
    ("model_drift", 0.10),
    ("null_or_empty_vectors", 0.15),
    ("vector_index_parity", 0.15),
    ("orphaned_embeddings", 0.15),
];

pub struct HealthReporter;

impl HealthReporter {
    pub async fn build(accessor: &Accessor, embeddings: &dyn EmbeddingProvider, config: &SignetConfig) -> SignetResult<HealthReport> {
        let checks = vec![
            checks::provider_reachability(embeddings).await,
            checks::embedding_coverage(accessor)?,
            checks::dimension_mismatch(accessor, config)?,
            checks::model_drift(accessor)?,
            checks::null_or_empty_vectors(accessor)?,
            checks::vector_index_parity(accessor)?,
            checks::orphaned_embeddings(accessor)?,
        ];
        let score = Self::weighted_score(&checks);
        let status = if score >= HEALTH_SCORE_HEALTHY {
            OverallStatus::Healthy
        } else if score >= HEALTH_SCORE_DEGRADED {
            OverallStatus::Degraded
        } else {
            OverallStatus::Unhealthy
        };
        Ok(HealthReport { checks, score, status })
    }

    fn weighted_score(checks: &[CheckResult]) -> f64 {
        checks
            .iter()
            .map(|c| {
                let weight = WEIGHTS.iter().find(|(name, _)| *name == c.name).map(|(_, w)| *w).unwrap_or(0.0);
                weight * c.status.score()
            })
            .sum()
    }
}
