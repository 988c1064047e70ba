//! Typed, clamped daemon configuration (spec §4.E).
//!
//! Loaded once at startup from YAML. Both flat (`alpha: 0.5`) and
//! nested (`search: { alpha: 0.5 }`) key layouts are accepted — nested
//! wins on conflict. Unknown keys are logged, never rejected. Parse
//! failures fall back to [`SignetConfig::default`] (never propagate an
//! error out of the loader, per spec: "Parse failures fall back to
//! documented defaults").

use serde_yaml::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceMode {
    Observe,
    Execute,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local-http".into(),
            model: "default".into(),
            dimensions: 384,
            base_url: "http://127.0.0.1:11434/api/embeddings".into(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub alpha: f64,
    pub top_k: usize,
    pub min_score: f64,
    pub rehearsal_enabled: bool,
    pub rehearsal_weight: f64,
    pub rehearsal_half_life_days: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            top_k: 50,
            min_score: 0.05,
            rehearsal_enabled: true,
            rehearsal_weight: 0.1,
            rehearsal_half_life_days: 14.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutonomousConfig {
    pub enabled: bool,
    pub frozen: bool,
    pub allow_update_delete: bool,
    pub maintenance_interval_ms: i64,
    pub maintenance_mode: MaintenanceMode,
}

impl Default for AutonomousConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frozen: false,
            allow_update_delete: false,
            maintenance_interval_ms: 3_600_000,
            maintenance_mode: MaintenanceMode::Observe,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub provider: String,
    pub model: String,
    pub timeout_ms: i64,
    pub min_confidence: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: "local-http".into(),
            model: "default".into(),
            timeout_ms: 30_000,
            min_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_ms: i64,
    pub max_retries: u32,
    pub lease_timeout_ms: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_ms: 2_000,
            max_retries: 3,
            lease_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub enabled: bool,
    pub boost_weight: f64,
    pub boost_timeout_ms: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            boost_weight: 0.15,
            boost_timeout_ms: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub model: String,
    pub top_n: usize,
    pub timeout_ms: i64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "default".into(),
            top_n: 20,
            timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepairConfig {
    pub reembed_cooldown_ms: i64,
    pub reembed_hourly_budget: u32,
    pub requeue_cooldown_ms: i64,
    pub requeue_hourly_budget: u32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            reembed_cooldown_ms: 60_000,
            reembed_hourly_budget: 10,
            requeue_cooldown_ms: 60_000,
            requeue_hourly_budget: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardrailsConfig {
    pub max_content_chars: usize,
    pub chunk_target_chars: usize,
    pub recall_truncate_chars: usize,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 20_000,
            chunk_target_chars: 2_000,
            recall_truncate_chars: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineV2Config {
    pub enabled: bool,
    pub shadow_mode: bool,
    pub mutations_frozen: bool,
    pub autonomous: AutonomousConfig,
    pub extraction: ExtractionConfig,
    pub worker: WorkerConfig,
    pub graph: GraphConfig,
    pub reranker: RerankerConfig,
    pub repair: RepairConfig,
    pub guardrails: GuardrailsConfig,
}

impl Default for PipelineV2Config {
    fn default() -> Self {
        Self {
            enabled: false,
            shadow_mode: false,
            mutations_frozen: false,
            autonomous: AutonomousConfig::default(),
            extraction: ExtractionConfig::default(),
            worker: WorkerConfig::default(),
            graph: GraphConfig::default(),
            reranker: RerankerConfig::default(),
            repair: RepairConfig::default(),
            guardrails: GuardrailsConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub window_ms: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_ms: 30 * 24 * 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContinuityConfig {
    pub time_interval_ms: i64,
    pub prompt_interval: u64,
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            time_interval_ms: crate::constants::DEFAULT_CHECKPOINT_TIME_INTERVAL_MS,
            prompt_interval: crate::constants::DEFAULT_CHECKPOINT_PROMPT_INTERVAL as u64,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignetConfig {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub pipeline_v2: PipelineV2Config,
    pub retention: RetentionConfig,
    pub continuity: ContinuityConfig,
}

impl SignetConfig {
    /// Load from a YAML file, falling back to defaults on any failure.
    /// Never returns `Err` — see module docs.
    pub fn load(path: &Path) -> SignetConfig {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config file unreadable, using defaults");
                return SignetConfig::default();
            }
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> SignetConfig {
        let value: Value = match serde_yaml::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "config parse failed, using defaults");
                return SignetConfig::default();
            }
        };
        warn_unknown_keys(&value);
        let mut cfg = SignetConfig::default();
        apply(&value, &mut cfg);
        cfg.clamp();
        cfg
    }
}

const KNOWN_TOP_KEYS: &[&str] = &[
    "embedding", "search", "pipelineV2", "pipeline_v2", "retention", "continuity",
    // flat aliases accepted at top level
    "alpha", "topK", "top_k", "minScore", "min_score",
    "provider", "model", "dimensions", "baseUrl", "base_url", "apiKey", "api_key",
];

fn warn_unknown_keys(value: &Value) {
    if let Value::Mapping(map) = value {
        for (k, _) in map {
            if let Some(key) = k.as_str() {
                if !KNOWN_TOP_KEYS.contains(&key) {
                    tracing::warn!(key, "unknown config key ignored");
                }
            }
        }
    }
}

fn str_at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = v;
    for seg in path {
        cur = cur.get(seg)?;
    }
    cur.as_str()
}

fn f64_at(v: &Value, path: &[&str]) -> Option<f64> {
    let mut cur = v;
    for seg in path {
        cur = cur.get(seg)?;
    }
    cur.as_f64()
}

fn u64_at(v: &Value, path: &[&str]) -> Option<u64> {
    let mut cur = v;
    for seg in path {
        cur = cur.get(seg)?;
    }
    cur.as_u64()
}

fn bool_at(v: &Value, path: &[&str]) -> Option<bool> {
    let mut cur = v;
    for seg in path {
        cur = cur.get(seg)?;
    }
    cur.as_bool()
}

/// Read a key that may appear flat at the top level or nested under a
/// section; nested wins when both are present.
fn str_field(v: &Value, flat: &str, nested: &[&str]) -> Option<String> {
    let nested_val = str_at(v, nested);
    nested_val.or_else(|| str_at(v, &[flat])).map(|s| s.to_string())
}

fn f64_field(v: &Value, flat: &str, nested: &[&str]) -> Option<f64> {
    f64_at(v, nested).or_else(|| f64_at(v, &[flat]))
}

fn u64_field(v: &Value, flat: &str, nested: &[&str]) -> Option<u64> {
    u64_at(v, nested).or_else(|| u64_at(v, &[flat]))
}

fn bool_field(v: &Value, flat: &str, nested: &[&str]) -> Option<bool> {
    bool_at(v, nested).or_else(|| bool_at(v, &[flat]))
}

fn apply(v: &Value, cfg: &mut SignetConfig) {
    // embedding.*
    if let Some(s) = str_field(v, "provider", &["embedding", "provider"]) {
        cfg.embedding.provider = s;
    }
    if let Some(s) = str_field(v, "model", &["embedding", "model"]) {
        cfg.embedding.model = s;
    }
    if let Some(n) = u64_field(v, "dimensions", &["embedding", "dimensions"]) {
        cfg.embedding.dimensions = n as usize;
    }
    if let Some(s) = str_field(v, "baseUrl", &["embedding", "base_url"])
        .or_else(|| str_field(v, "base_url", &["embedding", "baseUrl"]))
    {
        cfg.embedding.base_url = s;
    }
    if let Some(s) = str_field(v, "apiKey", &["embedding", "api_key"]) {
        cfg.embedding.api_key = Some(s);
    }

    // search.*
    if let Some(n) = f64_field(v, "alpha", &["search", "alpha"]) {
        cfg.search.alpha = n;
    }
    if let Some(n) = u64_field(v, "topK", &["search", "top_k"])
        .or_else(|| u64_field(v, "top_k", &["search", "topK"]))
    {
        cfg.search.top_k = n as usize;
    }
    if let Some(n) = f64_field(v, "minScore", &["search", "min_score"]) {
        cfg.search.min_score = n;
    }
    if let Some(b) = bool_field(v, "rehearsalEnabled", &["search", "rehearsal_enabled"]) {
        cfg.search.rehearsal_enabled = b;
    }
    if let Some(n) = f64_field(v, "rehearsalWeight", &["search", "rehearsal_weight"]) {
        cfg.search.rehearsal_weight = n;
    }
    if let Some(n) = f64_field(
        v,
        "rehearsalHalfLifeDays",
        &["search", "rehearsal_half_life_days"],
    ) {
        cfg.search.rehearsal_half_life_days = n;
    }

    // pipelineV2.*
    let p2 = v.get("pipelineV2").or_else(|| v.get("pipeline_v2"));
    if let Some(p2) = p2 {
        if let Some(b) = bool_at(p2, &["enabled"]) {
            cfg.pipeline_v2.enabled = b;
        }
        if let Some(b) = bool_at(p2, &["shadowMode"]) {
            cfg.pipeline_v2.shadow_mode = b;
        }
        if let Some(b) = bool_at(p2, &["mutationsFrozen"]) {
            cfg.pipeline_v2.mutations_frozen = b;
        }
        if let Some(a) = p2.get("autonomous") {
            if let Some(b) = bool_at(a, &["enabled"]) {
                cfg.pipeline_v2.autonomous.enabled = b;
            }
            if let Some(b) = bool_at(a, &["frozen"]) {
                cfg.pipeline_v2.autonomous.frozen = b;
            }
            if let Some(b) = bool_at(a, &["allowUpdateDelete"]) {
                cfg.pipeline_v2.autonomous.allow_update_delete = b;
            }
            if let Some(n) = u64_at(a, &["maintenanceIntervalMs"]) {
                cfg.pipeline_v2.autonomous.maintenance_interval_ms = n as i64;
            }
            if let Some(s) = str_at(a, &["maintenanceMode"]) {
                cfg.pipeline_v2.autonomous.maintenance_mode = if s == "execute" {
                    MaintenanceMode::Execute
                } else {
                    MaintenanceMode::Observe
                };
            }
        }
        if let Some(e) = p2.get("extraction") {
            if let Some(s) = str_at(e, &["provider"]) {
                cfg.pipeline_v2.extraction.provider = s.to_string();
            }
            if let Some(s) = str_at(e, &["model"]) {
                cfg.pipeline_v2.extraction.model = s.to_string();
            }
            if let Some(n) = u64_at(e, &["timeout"]) {
                cfg.pipeline_v2.extraction.timeout_ms = n as i64;
            }
            if let Some(n) = f64_at(e, &["minConfidence"]) {
                cfg.pipeline_v2.extraction.min_confidence = n;
            }
        }
        if let Some(w) = p2.get("worker") {
            if let Some(n) = u64_at(w, &["pollMs"]) {
                cfg.pipeline_v2.worker.poll_ms = n as i64;
            }
            if let Some(n) = u64_at(w, &["maxRetries"]) {
                cfg.pipeline_v2.worker.max_retries = n as u32;
            }
            if let Some(n) = u64_at(w, &["leaseTimeoutMs"]) {
                cfg.pipeline_v2.worker.lease_timeout_ms = n as i64;
            }
        }
        if let Some(g) = p2.get("graph") {
            if let Some(b) = bool_at(g, &["enabled"]) {
                cfg.pipeline_v2.graph.enabled = b;
            }
            if let Some(n) = f64_at(g, &["boostWeight"]) {
                cfg.pipeline_v2.graph.boost_weight = n;
            }
            if let Some(n) = u64_at(g, &["boostTimeoutMs"]) {
                cfg.pipeline_v2.graph.boost_timeout_ms = n as i64;
            }
        }
        if let Some(r) = p2.get("reranker") {
            if let Some(b) = bool_at(r, &["enabled"]) {
                cfg.pipeline_v2.reranker.enabled = b;
            }
            if let Some(s) = str_at(r, &["model"]) {
                cfg.pipeline_v2.reranker.model = s.to_string();
            }
            if let Some(n) = u64_at(r, &["topN"]) {
                cfg.pipeline_v2.reranker.top_n = n as usize;
            }
            if let Some(n) = u64_at(r, &["timeoutMs"]) {
                cfg.pipeline_v2.reranker.timeout_ms = n as i64;
            }
        }
        if let Some(r) = p2.get("repair") {
            if let Some(n) = u64_at(r, &["reembedCooldownMs"]) {
                cfg.pipeline_v2.repair.reembed_cooldown_ms = n as i64;
            }
            if let Some(n) = u64_at(r, &["reembedHourlyBudget"]) {
                cfg.pipeline_v2.repair.reembed_hourly_budget = n as u32;
            }
            if let Some(n) = u64_at(r, &["requeueCooldownMs"]) {
                cfg.pipeline_v2.repair.requeue_cooldown_ms = n as i64;
            }
            if let Some(n) = u64_at(r, &["requeueHourlyBudget"]) {
                cfg.pipeline_v2.repair.requeue_hourly_budget = n as u32;
            }
        }
        if let Some(g) = p2.get("guardrails") {
            if let Some(n) = u64_at(g, &["maxContentChars"]) {
                cfg.pipeline_v2.guardrails.max_content_chars = n as usize;
            }
            if let Some(n) = u64_at(g, &["chunkTargetChars"]) {
                cfg.pipeline_v2.guardrails.chunk_target_chars = n as usize;
            }
            if let Some(n) = u64_at(g, &["recallTruncateChars"]) {
                cfg.pipeline_v2.guardrails.recall_truncate_chars = n as usize;
            }
        }
    }

    // retention.*
    if let Some(r) = v.get("retention") {
        if let Some(n) = u64_at(r, &["windowMs"]).or_else(|| u64_at(r, &["window_ms"])) {
            cfg.retention.window_ms = n as i64;
        }
    }

    // continuity.*
    if let Some(c) = v.get("continuity") {
        if let Some(n) = u64_at(c, &["timeIntervalMs"]).or_else(|| u64_at(c, &["time_interval_ms"])) {
            cfg.continuity.time_interval_ms = n as i64;
        }
        if let Some(n) = u64_at(c, &["promptInterval"]).or_else(|| u64_at(c, &["prompt_interval"])) {
            cfg.continuity.prompt_interval = n;
        }
    }
}

impl SignetConfig {
    /// Clamp every numeric field to a documented range (spec §4.E).
    pub fn clamp(&mut self) {
        self.search.alpha = self.search.alpha.clamp(0.0, 1.0);
        self.search.top_k = self.search.top_k.clamp(1, 500);
        self.search.min_score = self.search.min_score.clamp(0.0, 1.0);
        self.search.rehearsal_weight = self.search.rehearsal_weight.clamp(0.0, 5.0);
        self.search.rehearsal_half_life_days = self.search.rehearsal_half_life_days.clamp(0.1, 3650.0);

        self.embedding.dimensions = self.embedding.dimensions.clamp(1, 8192);

        self.pipeline_v2.autonomous.maintenance_interval_ms =
            self.pipeline_v2.autonomous.maintenance_interval_ms.clamp(1_000, 86_400_000);
        self.pipeline_v2.extraction.timeout_ms = self.pipeline_v2.extraction.timeout_ms.clamp(100, 300_000);
        self.pipeline_v2.extraction.min_confidence = self.pipeline_v2.extraction.min_confidence.clamp(0.0, 1.0);
        self.pipeline_v2.worker.poll_ms = self.pipeline_v2.worker.poll_ms.clamp(100, 3_600_000);
        self.pipeline_v2.worker.max_retries = self.pipeline_v2.worker.max_retries.clamp(0, 50);
        self.pipeline_v2.worker.lease_timeout_ms = self.pipeline_v2.worker.lease_timeout_ms.clamp(1_000, 3_600_000);
        self.pipeline_v2.graph.boost_weight = self.pipeline_v2.graph.boost_weight.clamp(0.0, 1.0);
        self.pipeline_v2.graph.boost_timeout_ms = self.pipeline_v2.graph.boost_timeout_ms.clamp(1, 60_000);
        self.pipeline_v2.reranker.top_n = self.pipeline_v2.reranker.top_n.clamp(1, 200);
        self.pipeline_v2.reranker.timeout_ms = self.pipeline_v2.reranker.timeout_ms.clamp(1, 60_000);
        self.pipeline_v2.repair.reembed_cooldown_ms = self.pipeline_v2.repair.reembed_cooldown_ms.max(0);
        self.pipeline_v2.repair.requeue_cooldown_ms = self.pipeline_v2.repair.requeue_cooldown_ms.max(0);
        self.pipeline_v2.guardrails.max_content_chars =
            self.pipeline_v2.guardrails.max_content_chars.clamp(1, 1_000_000);
        self.pipeline_v2.guardrails.chunk_target_chars =
            self.pipeline_v2.guardrails.chunk_target_chars.clamp(100, 100_000);
        self.pipeline_v2.guardrails.recall_truncate_chars =
            self.pipeline_v2.guardrails.recall_truncate_chars.clamp(10, 100_000);

        self.retention.window_ms = self.retention.window_ms.max(0);

        self.continuity.time_interval_ms = self.continuity.time_interval_ms.clamp(1_000, 86_400_000);
        self.continuity.prompt_interval = self.continuity.prompt_interval.clamp(1, 10_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = SignetConfig::default();
        assert_eq!(cfg.search.alpha, 0.5);
        assert_eq!(cfg.retention.window_ms, 30 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn nested_layout_parses() {
        let yaml = r#"
search:
  alpha: 0.7
  top_k: 10
pipelineV2:
  enabled: true
  worker:
    pollMs: 500
"#;
        let cfg = SignetConfig::parse(yaml);
        assert_eq!(cfg.search.alpha, 0.7);
        assert_eq!(cfg.search.top_k, 10);
        assert!(cfg.pipeline_v2.enabled);
        assert_eq!(cfg.pipeline_v2.worker.poll_ms, 500);
    }

    #[test]
    fn flat_layout_parses() {
        let yaml = "alpha: 0.9\ntopK: 25\n";
        let cfg = SignetConfig::parse(yaml);
        assert_eq!(cfg.search.alpha, 0.9);
        assert_eq!(cfg.search.top_k, 25);
    }

    #[test]
    fn nested_wins_over_flat_on_conflict() {
        let yaml = "alpha: 0.9\nsearch:\n  alpha: 0.2\n";
        let cfg = SignetConfig::parse(yaml);
        assert_eq!(cfg.search.alpha, 0.2);
    }

    #[test]
    fn clamp_rejects_out_of_range_alpha() {
        let yaml = "search:\n  alpha: 5.0\n";
        let cfg = SignetConfig::parse(yaml);
        assert_eq!(cfg.search.alpha, 1.0);
    }

    #[test]
    fn malformed_yaml_falls_back_to_defaults() {
        let cfg = SignetConfig::parse("not: valid: yaml: at: all: [");
        assert_eq!(cfg.search.alpha, SignetConfig::default().search.alpha);
    }
}
