//! Shapes shared across the recall pipeline stages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use signet_core::memory::Memory;
use signet_storage::queries::memory_search::RecallFilters;

#[derive(Debug, Clone)]
pub struct RecallRequest {
    pub query: String,
    pub limit: usize,
    pub filters: RecallFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallSource {
    Hybrid,
    Vector,
    Keyword,
}

impl RecallSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RecallSource::Hybrid => "hybrid",
            RecallSource::Vector => "vector",
            RecallSource::Keyword => "keyword",
        }
    }
}

/// One candidate moving through the pipeline. `score` is mutated by
/// every stage in place; `memory.content` is only truncated at the
/// final shaping step.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub memory: Memory,
    pub score: f64,
    pub source: RecallSource,
}

/// A finished, shaped result (spec §4.G step 7 / spec §6 "Recall result").
#[derive(Debug, Clone, Serialize)]
pub struct RecallItem {
    #[serde(rename = "id")]
    pub memory_id: String,
    pub content: String,
    pub content_length: usize,
    pub truncated: bool,
    pub score: f64,
    pub source: &'static str,
    #[serde(rename = "type")]
    pub memory_type: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub importance: f64,
    pub who: Option<String>,
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub supplementary: bool,
}

/// The shaped results plus which fusion method actually produced them
/// (spec §4.G final step: `"hybrid"` only when a vector score was
/// present in the surviving candidate set, `"keyword"` otherwise).
#[derive(Debug, Clone)]
pub struct RecallOutcome {
    pub results: Vec<RecallItem>,
    pub method: &'static str,
}
