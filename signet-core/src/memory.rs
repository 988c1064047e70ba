//! The universal memory record and its small satellite types.
//!
//! `type` is deliberately a free string at the storage boundary (per
//! spec §3), but the well-known values get a typed `MemoryKind` for
//! call sites that want to match on them (inference in `signet-ingest`,
//! filters in `signet-retrieval`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One of the documented memory types, or an arbitrary caller-supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryKind {
    Fact,
    Preference,
    Decision,
    Rationale,
    Issue,
    Rule,
    Learning,
    SessionSummary,
    Other(String),
}

impl MemoryKind {
    pub fn as_str(&self) -> &str {
        match self {
            MemoryKind::Fact => "fact",
            MemoryKind::Preference => "preference",
            MemoryKind::Decision => "decision",
            MemoryKind::Rationale => "rationale",
            MemoryKind::Issue => "issue",
            MemoryKind::Rule => "rule",
            MemoryKind::Learning => "learning",
            MemoryKind::SessionSummary => "session_summary",
            MemoryKind::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for MemoryKind {
    fn from(s: &str) -> Self {
        match s {
            "fact" => MemoryKind::Fact,
            "preference" => MemoryKind::Preference,
            "decision" => MemoryKind::Decision,
            "rationale" => MemoryKind::Rationale,
            "issue" => MemoryKind::Issue,
            "rule" => MemoryKind::Rule,
            "learning" => MemoryKind::Learning,
            "session_summary" => MemoryKind::SessionSummary,
            other => MemoryKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    None,
    Pending,
    Done,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::None => "none",
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Done => "done",
            ExtractionStatus::Failed => "failed",
        }
    }
}

impl From<&str> for ExtractionStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => ExtractionStatus::Pending,
            "done" => ExtractionStatus::Done,
            "failed" => ExtractionStatus::Failed,
            _ => ExtractionStatus::None,
        }
    }
}

/// The atomic unit of the memory store. See spec §3 "Memory".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub normalized_content: String,
    pub content_hash: String,
    pub memory_type: MemoryKind,
    pub tags: Vec<String>,
    pub importance: f64,
    pub pinned: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub who: Option<String>,
    pub why: Option<String>,
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub embedding_model: Option<String>,
    pub extraction_status: ExtractionStatus,
    pub extraction_model: Option<String>,
}

/// Normalize content for hashing/dedupe: lowercase, trim, collapse
/// internal whitespace. Applied uniformly at the one call site that
/// computes `content_hash` (see SPEC_FULL.md Open Question #1).
pub fn normalize_content(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 of the normalized content, hex-encoded.
pub fn content_hash(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Normalize, sort, and dedupe a tag list (spec §3: "order-insensitive set").
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for t in tags {
        let t = t.trim().to_lowercase();
        if !t.is_empty() {
            seen.insert(t);
        }
    }
    seen.into_iter().collect()
}

/// Join tags into the comma-joined storage form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Split the comma-joined storage form back into a tag list.
pub fn split_tags(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        Vec::new()
    } else {
        joined.split(',').map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_content("  Rotate   Keys\tWeekly "), "rotate keys weekly");
    }

    #[test]
    fn hash_is_deterministic() {
        let a = content_hash(&normalize_content("Rotate keys weekly"));
        let b = content_hash(&normalize_content("rotate keys weekly"));
        assert_eq!(a, b);
    }

    #[test]
    fn tags_are_sorted_deduped_lowercased() {
        let tags = normalize_tags(&["Api".into(), "security".into(), "api".into()]);
        assert_eq!(tags, vec!["api".to_string(), "security".to_string()]);
    }
}
