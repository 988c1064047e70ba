//! Named constants shared across crates so magic numbers don't drift
//! between storage, retrieval, and repair.

/// BM25 vs. cosine fusion weight lives in [`crate::config::SearchConfig`]
/// since it's operator-tunable; these are the values the spec pins down.

/// FTS-vs-memories row-count mismatch ratio above which
/// `checkFtsConsistency` reports unhealthy.
pub const FTS_MISMATCH_THRESHOLD: f64 = 0.10;

/// Soft-deleted memories are eligible for hard purge once this many
/// milliseconds have passed since `deleted_at`, by default.
pub const DEFAULT_RETENTION_WINDOW_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// `critical:` content prefix forces this importance regardless of any
/// caller-supplied value (Open Question #4).
pub const CRITICAL_PREFIX_IMPORTANCE: f64 = 1.0;

/// Continuity checkpoint cadence defaults (spec §4.K).
pub const DEFAULT_CHECKPOINT_PROMPT_INTERVAL: u32 = 5;
pub const DEFAULT_CHECKPOINT_TIME_INTERVAL_MS: i64 = 10 * 60 * 1000;

/// Health score bands (spec §4.M).
pub const HEALTH_SCORE_HEALTHY: f64 = 0.8;
pub const HEALTH_SCORE_DEGRADED: f64 = 0.5;

/// Embedding availability probes are cached for this long before the
/// provider is hit again.
pub const EMBEDDING_AVAILABILITY_CACHE_MS: i64 = 30_000;
pub const EMBEDDING_HTTP_TIMEOUT_MS: u64 = 30_000;
