//! The 7 named embedding-health checks (spec §4.M). Each is a thin
//! wrapper around a `signet_storage::queries::maintenance` read, scored
//! `ok | warn | fail` against a documented threshold.

use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_core::traits::EmbeddingProvider;
use signet_storage::queries::maintenance;
use signet_storage::Accessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl CheckStatus {
    /// `ok=1, warn=0.5, fail=0` (spec §4.M).
    pub fn score(self) -> f64 {
        match self {
            CheckStatus::Ok => 1.0,
            CheckStatus::Warn => 0.5,
            CheckStatus::Fail => 0.0,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub detail: Option<String>,
    pub fix: Option<&'static str>,
}

pub async fn provider_reachability(embeddings: &dyn EmbeddingProvider) -> CheckResult {
    let availability = embeddings.available().await;
    if availability.available {
        CheckResult {
            name: "provider_reachability",
            status: CheckStatus::Ok,
            message: format!("{} reachable", embeddings.model_name()),
            detail: None,
            fix: None,
        }
    } else {
        CheckResult {
            name: "provider_reachability",
            status: CheckStatus::Warn,
            message: "embedding provider unreachable, recall degrades to keyword-only".to_string(),
            detail: availability.error,
            fix: Some("check embedding.baseUrl and provider credentials"),
        }
    }
}

pub fn embedding_coverage(accessor: &Accessor) -> SignetResult<CheckResult> {
    let active = accessor.with_read_db(signet_storage::queries::memory_crud::count_active)?;
    let embedded = accessor.with_read_db(maintenance::count_embedded_active)?;
    let ratio = if active == 0 { 1.0 } else { embedded as f64 / active as f64 };
    let status = if ratio >= 0.95 {
        CheckStatus::Ok
    } else if ratio >= 0.70 {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    Ok(CheckResult {
        name: "embedding_coverage",
        status,
        message: format!("{embedded}/{active} active memories embedded ({:.1}%)", ratio * 100.0),
        detail: None,
        fix: (status != CheckStatus::Ok).then_some("run the reembedMissingMemories repair action"),
    })
}

pub fn dimension_mismatch(accessor: &Accessor, config: &SignetConfig) -> SignetResult<CheckResult> {
    let expected = config.embedding.dimensions;
    let mismatched = accessor.with_read_db(|conn| maintenance::count_dimension_mismatches(conn, expected))?;
    let status = if mismatched == 0 { CheckStatus::Ok } else { CheckStatus::Fail };
    Ok(CheckResult {
        name: "dimension_mismatch",
        status,
        message: format!("{mismatched} embeddings with dimensions != {expected}"),
        detail: None,
        fix: (mismatched > 0).then_some("re-embed affected memories with the configured model"),
    })
}

pub fn model_drift(accessor: &Accessor) -> SignetResult<CheckResult> {
    let models = accessor.with_read_db(maintenance::distinct_embedding_models)?;
    let status = match models.len() {
        0 | 1 => CheckStatus::Ok,
        2 => CheckStatus::Warn,
        _ => CheckStatus::Fail,
    };
    Ok(CheckResult {
        name: "model_drift",
        status,
        message: format!("{} distinct embedding_model values in use", models.len()),
        detail: (models.len() > 1).then(|| models.join(", ")),
        fix: (status != CheckStatus::Ok).then_some("re-embed with a single configured model"),
    })
}

pub fn null_or_empty_vectors(accessor: &Accessor) -> SignetResult<CheckResult> {
    let count = accessor.with_read_db(maintenance::count_null_or_empty_vectors)?;
    let status = if count == 0 { CheckStatus::Ok } else { CheckStatus::Fail };
    Ok(CheckResult {
        name: "null_or_empty_vectors",
        status,
        message: format!("{count} embeddings with a null or empty vector"),
        detail: None,
        fix: (count > 0).then_some("rebuild affected embeddings"),
    })
}

pub fn vector_index_parity(accessor: &Accessor) -> SignetResult<CheckResult> {
    let (embeddings, vec_index) = accessor.with_read_db(maintenance::embeddings_vec_index_parity)?;
    let ratio = if embeddings == 0 { 0.0 } else { (embeddings - vec_index).unsigned_abs() as f64 / embeddings as f64 };
    let status = if ratio == 0.0 {
        CheckStatus::Ok
    } else if ratio < signet_core::constants::FTS_MISMATCH_THRESHOLD {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    Ok(CheckResult {
        name: "vector_index_parity",
        status,
        message: format!("embeddings={embeddings} vec_index={vec_index}"),
        detail: None,
        fix: (status != CheckStatus::Ok).then_some("rebuild the vector index"),
    })
}

pub fn orphaned_embeddings(accessor: &Accessor) -> SignetResult<CheckResult> {
    let count = accessor.with_read_db(maintenance::count_orphaned_embeddings)?;
    let status = if count == 0 { CheckStatus::Ok } else { CheckStatus::Warn };
    Ok(CheckResult {
        name: "orphaned_embeddings",
        status,
        message: format!("{count} embeddings whose source memory is missing or deleted"),
        detail: None,
        fix: (count > 0).then_some("run the reembedMissingMemories repair action after a retention sweep"),
    })
}
