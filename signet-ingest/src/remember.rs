//! The `remember()` ingest pipeline (spec §4.F): prefix parsing, tag
//! extraction, type inference, hashing, a single write transaction,
//! then an async embed and an optional extraction-job enqueue.

use chrono::Utc;

use signet_core::config::SignetConfig;
use signet_core::errors::SignetResult;
use signet_core::history::MutationContext;
use signet_core::memory::{content_hash, normalize_content, normalize_tags, ExtractionStatus, Memory, MemoryKind};
use signet_core::traits::EmbeddingProvider;
use signet_storage::queries::jobs;
use signet_storage::tx;
use signet_storage::Accessor;

/// Ordered substring -> type hints, first match wins (spec §4.F step 3).
const TYPE_HINTS: &[(&str, &str)] = &[
    ("prefer", "preference"),
    ("likes", "preference"),
    ("want", "preference"),
    ("decided", "decision"),
    ("agreed", "decision"),
    ("will use", "decision"),
    ("learned", "learning"),
    ("til ", "learning"),
    ("bug", "issue"),
    ("never", "rule"),
    ("always", "rule"),
    ("must", "rule"),
];

#[derive(Debug, Clone, Default)]
pub struct RememberRequest {
    pub raw: String,
    pub who: Option<String>,
    pub project: Option<String>,
    pub importance: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub pinned: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RememberResult {
    pub id: String,
    pub memory_type: MemoryKind,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub importance: f64,
    pub content: String,
    pub embedded: bool,
}

fn strip_critical_prefix(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.get(0..9) {
        if rest.eq_ignore_ascii_case("critical:") {
            return (trimmed[9..].trim_start().to_string(), true);
        }
    }
    (trimmed.to_string(), false)
}

/// Parse a leading `[tag1, tag2, ...]: body` form, if present.
fn extract_bracket_tags(body: &str) -> (String, Option<Vec<String>>) {
    let body = body.trim();
    if !body.starts_with('[') {
        return (body.to_string(), None);
    }
    let Some(close) = body.find(']') else {
        return (body.to_string(), None);
    };
    let after = &body[close + 1..];
    let Some(rest) = after.strip_prefix(':') else {
        return (body.to_string(), None);
    };
    let tag_list = &body[1..close];
    let tags: Vec<String> = tag_list.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
    (rest.trim_start().to_string(), Some(tags))
}

fn infer_type(content: &str) -> MemoryKind {
    let lower = content.to_lowercase();
    for (hint, kind) in TYPE_HINTS {
        if lower.contains(hint) {
            return MemoryKind::from(*kind);
        }
    }
    MemoryKind::Fact
}

pub async fn remember(
    accessor: &Accessor,
    embeddings: &dyn EmbeddingProvider,
    config: &SignetConfig,
    req: RememberRequest,
) -> SignetResult<RememberResult> {
    if req.raw.trim().is_empty() {
        return Err(signet_core::errors::IngestError::EmptyContent.into());
    }
    if req.raw.len() > config.pipeline_v2.guardrails.max_content_chars {
        return Err(signet_core::errors::IngestError::ContentTooLong {
            max: config.pipeline_v2.guardrails.max_content_chars,
        }
        .into());
    }

    let (after_prefix, prefix_pinned) = strip_critical_prefix(&req.raw);
    let (body, bracket_tags) = extract_bracket_tags(&after_prefix);

    let pinned = prefix_pinned || req.pinned.unwrap_or(false);
    let importance = if prefix_pinned { 1.0 } else { req.importance.unwrap_or(0.5) };
    let tags = normalize_tags(&bracket_tags.or(req.tags).unwrap_or_default());
    let memory_type = infer_type(&body);

    let normalized = normalize_content(&body);
    let hash = content_hash(&normalized);
    let now = Utc::now();
    let id = uuid::Uuid::new_v4().to_string();

    let memory = Memory {
        id: id.clone(),
        content: body.clone(),
        normalized_content: normalized,
        content_hash: hash,
        memory_type: memory_type.clone(),
        tags: tags.clone(),
        importance,
        pinned,
        is_deleted: false,
        deleted_at: None,
        version: 1,
        access_count: 0,
        last_accessed: None,
        who: req.who.clone(),
        why: None,
        project: req.project.clone(),
        created_at: now,
        updated_at: now,
        updated_by: req.who.clone(),
        source_type: Some("remember".to_string()),
        source_id: None,
        embedding_model: None,
        extraction_status: ExtractionStatus::None,
        extraction_model: None,
    };

    let ctx = MutationContext::new(signet_core::history::ActorType::Agent);
    let outcome = accessor.with_write_tx(|conn| tx::ingest(conn, memory, &ctx, now))?;

    let stored = match outcome {
        tx::IngestOutcome::Inserted(m) => m,
        tx::IngestOutcome::Duplicate(existing) => {
            return Ok(RememberResult {
                id: existing.id,
                memory_type: existing.memory_type,
                tags: existing.tags,
                pinned: existing.pinned,
                importance: existing.importance,
                content: existing.content,
                embedded: existing.embedding_model.is_some(),
            });
        }
    };

    let embedded = match embeddings.embed(&stored.content).await {
        Some(vector) => {
            let model = embeddings.model_name().to_string();
            let embedding_id = uuid::Uuid::new_v4().to_string();
            let result = accessor.with_write_tx(|conn| {
                signet_storage::queries::vector_search::upsert_embedding(
                    conn,
                    &embedding_id,
                    &stored.id,
                    &stored.content_hash,
                    &vector,
                    &model,
                )
            });
            if let Err(e) = result {
                tracing::warn!(memory_id = %stored.id, error = %e, "failed to persist embedding after remember");
                false
            } else {
                true
            }
        }
        None => {
            tracing::info!(memory_id = %stored.id, "embedding unavailable, memory retrievable via keyword only");
            false
        }
    };

    if config.pipeline_v2.enabled {
        if let Err(e) = accessor.with_write_tx(|conn| jobs::enqueue_extraction(conn, &stored.id, Utc::now())) {
            tracing::warn!(memory_id = %stored.id, error = %e, "failed to enqueue extraction job");
        }
    }

    Ok(RememberResult {
        id: stored.id,
        memory_type,
        tags,
        pinned,
        importance,
        content: stored.content,
        embedded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_critical_prefix_case_insensitively() {
        let (body, pinned) = strip_critical_prefix("CRITICAL: rotate keys");
        assert!(pinned);
        assert_eq!(body, "rotate keys");
    }

    #[test]
    fn extracts_bracketed_tags_lowercased() {
        let (body, tags) = extract_bracket_tags("[Security, API]: rotate keys weekly");
        assert_eq!(body, "rotate keys weekly");
        assert_eq!(tags, Some(vec!["Security".to_string(), "API".to_string()]));
    }

    #[test]
    fn type_inference_first_match_wins_and_falls_through_to_fact() {
        assert_eq!(infer_type("rotate keys weekly").as_str(), "fact");
        assert_eq!(infer_type("I prefer dark mode").as_str(), "preference");
        assert_eq!(infer_type("never commit secrets").as_str(), "rule");
    }

    #[test]
    fn worked_example_from_spec_matches_critical_security_api_scenario() {
        let (after_prefix, pinned) = strip_critical_prefix("critical: [security, api]: rotate keys weekly");
        assert!(pinned);
        let (body, tags) = extract_bracket_tags(&after_prefix);
        assert_eq!(body, "rotate keys weekly");
        let tags = normalize_tags(&tags.unwrap());
        assert_eq!(tags, vec!["api".to_string(), "security".to_string()]);
        assert_eq!(infer_type(&body).as_str(), "fact");
    }
}
