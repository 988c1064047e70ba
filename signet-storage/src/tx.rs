//! Transaction closures (spec §4.C). Every mutation to `memories` goes
//! through exactly one of these; none performs network I/O, and every
//! one of them is meant to run inside `WriteConnection::with_write_tx`.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;

use signet_core::errors::SignetResult;
use signet_core::history::{ActorType, HistoryEvent, MutationContext};
use signet_core::memory::Memory;

use crate::queries::{entities, history, memory_crud, vector_search};

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Inserted(Memory),
    Duplicate(Memory),
}

/// Insert a new memory. On a `content_hash` collision among active
/// rows, return the existing row instead of erroring — dedupe policy
/// is the caller's call (spec §4.C "Ingest").
pub fn ingest(conn: &Connection, memory: Memory, ctx: &MutationContext, now: DateTime<Utc>) -> SignetResult<IngestOutcome> {
    if let Some(existing) = memory_crud::find_active_by_content_hash(conn, &memory.content_hash)? {
        return Ok(IngestOutcome::Duplicate(existing));
    }
    memory_crud::insert_memory(conn, &memory)?;
    history::record_event(
        conn,
        &memory.id,
        HistoryEvent::Created,
        None,
        Some(&memory.content),
        memory.who.as_deref(),
        Some("ingest"),
        &json!({}),
        ctx,
        now,
    )?;
    Ok(IngestOutcome::Inserted(memory))
}

#[derive(Debug, Clone)]
pub enum ModifyOutcome {
    Updated(Memory),
    NotFound,
    Deleted,
    VersionConflict,
    DuplicateContentHash,
    NoChanges,
}

/// A patch to apply to an existing memory. `None` fields are left
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatch {
    pub content: Option<String>,
    pub normalized_content: Option<String>,
    pub content_hash: Option<String>,
    pub tags: Option<Vec<String>>,
    pub importance: Option<f64>,
    pub pinned: Option<bool>,
    pub who: Option<String>,
    pub why: Option<String>,
    pub project: Option<String>,
    pub updated_by: Option<String>,
    pub new_vector: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
}

pub fn modify(
    conn: &Connection,
    id: &str,
    patch: MemoryPatch,
    if_version: Option<u64>,
    ctx: &MutationContext,
    now: DateTime<Utc>,
) -> SignetResult<ModifyOutcome> {
    let Some(mut memory) = memory_crud::get_memory(conn, id)? else {
        return Ok(ModifyOutcome::NotFound);
    };
    if memory.is_deleted {
        return Ok(ModifyOutcome::Deleted);
    }
    if let Some(expected) = if_version {
        if memory.version != expected {
            return Ok(ModifyOutcome::VersionConflict);
        }
    }

    let mut changed_fields: Vec<&'static str> = Vec::new();
    let content_changed = patch.content.is_some() && patch.content.as_deref() != Some(memory.content.as_str());

    if content_changed {
        if let Some(hash) = &patch.content_hash {
            if let Some(other) = memory_crud::find_active_by_content_hash(conn, hash)? {
                if other.id != memory.id {
                    return Ok(ModifyOutcome::DuplicateContentHash);
                }
            }
        }
        memory.content = patch.content.unwrap();
        if let Some(n) = patch.normalized_content {
            memory.normalized_content = n;
        }
        if let Some(h) = patch.content_hash {
            memory.content_hash = h;
        }
        memory.extraction_status = signet_core::memory::ExtractionStatus::None;
        vector_search::delete_embeddings_for_source(conn, &memory.id)?;
        changed_fields.push("content");
    }
    if let Some(tags) = patch.tags {
        memory.tags = signet_core::memory::normalize_tags(&tags);
        changed_fields.push("tags");
    }
    if let Some(i) = patch.importance {
        memory.importance = i;
        changed_fields.push("importance");
    }
    if let Some(p) = patch.pinned {
        memory.pinned = p;
        changed_fields.push("pinned");
    }
    if let Some(who) = patch.who {
        memory.who = Some(who);
        changed_fields.push("who");
    }
    if let Some(why) = patch.why {
        memory.why = Some(why);
        changed_fields.push("why");
    }
    if let Some(project) = patch.project {
        memory.project = Some(project);
        changed_fields.push("project");
    }
    memory.updated_by = patch.updated_by;

    if changed_fields.is_empty() {
        return Ok(ModifyOutcome::NoChanges);
    }

    memory.version += 1;
    memory.updated_at = now;
    memory_crud::replace_memory(conn, &memory)?;

    if let Some(vector) = patch.new_vector {
        let embedding_id = uuid::Uuid::new_v4().to_string();
        vector_search::upsert_embedding(
            conn,
            &embedding_id,
            &memory.id,
            &memory.content_hash,
            &vector,
            patch.embedding_model.as_deref().unwrap_or("unknown"),
        )?;
    }

    history::record_event(
        conn,
        &memory.id,
        HistoryEvent::Updated,
        None,
        Some(&memory.content),
        memory.updated_by.as_deref(),
        Some("modify"),
        &json!({ "changed_fields": changed_fields }),
        ctx,
        now,
    )?;

    Ok(ModifyOutcome::Updated(memory))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgetOutcome {
    Deleted,
    NotFound,
    AlreadyDeleted,
    VersionConflict,
    PinnedRequiresForce,
    AutonomousForceDenied,
}

/// Soft-delete a memory (spec §4.C "Forget"). Pinned rows require
/// `force=true` from any actor; a pipeline actor can never force-delete
/// a pinned row, regardless of `force`.
pub fn forget(
    conn: &Connection,
    id: &str,
    force: bool,
    if_version: Option<u64>,
    ctx: &MutationContext,
    now: DateTime<Utc>,
) -> SignetResult<ForgetOutcome> {
    let Some(mut memory) = memory_crud::get_memory(conn, id)? else {
        return Ok(ForgetOutcome::NotFound);
    };
    if memory.is_deleted {
        return Ok(ForgetOutcome::AlreadyDeleted);
    }
    if let Some(expected) = if_version {
        if memory.version != expected {
            return Ok(ForgetOutcome::VersionConflict);
        }
    }
    if memory.pinned {
        if ctx.actor_type == ActorType::Pipeline {
            return Ok(ForgetOutcome::AutonomousForceDenied);
        }
        if !force {
            return Ok(ForgetOutcome::PinnedRequiresForce);
        }
    }

    memory.is_deleted = true;
    memory.deleted_at = Some(now);
    memory.version += 1;
    memory.updated_at = now;
    memory_crud::replace_memory(conn, &memory)?;

    history::record_event(
        conn,
        &memory.id,
        HistoryEvent::Deleted,
        Some(&memory.content),
        None,
        None,
        Some("forget"),
        &json!({ "force": force }),
        ctx,
        now,
    )?;

    Ok(ForgetOutcome::Deleted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverOutcome {
    Recovered,
    NotFound,
    NotDeleted,
    VersionConflict,
    RetentionExpired,
}

pub fn recover(
    conn: &Connection,
    id: &str,
    retention_window_ms: i64,
    if_version: Option<u64>,
    ctx: &MutationContext,
    now: DateTime<Utc>,
) -> SignetResult<RecoverOutcome> {
    let Some(mut memory) = memory_crud::get_memory(conn, id)? else {
        return Ok(RecoverOutcome::NotFound);
    };
    if !memory.is_deleted {
        return Ok(RecoverOutcome::NotDeleted);
    }
    if let Some(expected) = if_version {
        if memory.version != expected {
            return Ok(RecoverOutcome::VersionConflict);
        }
    }
    let deleted_at = memory.deleted_at.unwrap_or(now);
    if (now - deleted_at).num_milliseconds() > retention_window_ms {
        return Ok(RecoverOutcome::RetentionExpired);
    }

    memory.is_deleted = false;
    memory.deleted_at = None;
    memory.version += 1;
    memory.updated_at = now;
    memory_crud::replace_memory(conn, &memory)?;

    history::record_event(
        conn,
        &memory.id,
        HistoryEvent::Recovered,
        None,
        Some(&memory.content),
        None,
        Some("recover"),
        &json!({}),
        ctx,
        now,
    )?;

    Ok(RecoverOutcome::Recovered)
}

#[derive(Debug, Clone)]
pub enum ExtractedDecision {
    Update { target_memory_id: String, new_content: String },
    Delete { target_memory_id: String },
    Merge { source_memory_id: String, target_memory_id: String, merged_content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyDecisionOutcome {
    Applied,
    NotFound,
    SkippedPinned,
}

/// Apply a semantic extraction decision (spec §4.C "ApplyDecision").
/// Soft-delete only; a merge writes both sides' history. Skips
/// silently when the affected source is pinned.
pub fn apply_decision(conn: &Connection, decision: ExtractedDecision, ctx: &MutationContext, now: DateTime<Utc>) -> SignetResult<ApplyDecisionOutcome> {
    match decision {
        ExtractedDecision::Update { target_memory_id, new_content } => {
            let Some(mut memory) = memory_crud::get_memory(conn, &target_memory_id)? else {
                return Ok(ApplyDecisionOutcome::NotFound);
            };
            if memory.pinned {
                return Ok(ApplyDecisionOutcome::SkippedPinned);
            }
            let old_content = memory.content.clone();
            let normalized = signet_core::memory::normalize_content(&new_content);
            let hash = signet_core::memory::content_hash(&normalized);
            memory.content = new_content;
            memory.normalized_content = normalized;
            memory.content_hash = hash;
            memory.extraction_status = signet_core::memory::ExtractionStatus::None;
            memory.version += 1;
            memory.updated_at = now;
            memory_crud::replace_memory(conn, &memory)?;
            vector_search::delete_embeddings_for_source(conn, &memory.id)?;
            history::record_event(
                conn, &memory.id, HistoryEvent::Updated, Some(&old_content), Some(&memory.content),
                None, Some("extraction_update"), &json!({}), ctx, now,
            )?;
            Ok(ApplyDecisionOutcome::Applied)
        }
        ExtractedDecision::Delete { target_memory_id } => {
            let outcome = forget(conn, &target_memory_id, false, None, ctx, now)?;
            match outcome {
                ForgetOutcome::Deleted => Ok(ApplyDecisionOutcome::Applied),
                ForgetOutcome::NotFound => Ok(ApplyDecisionOutcome::NotFound),
                _ => Ok(ApplyDecisionOutcome::SkippedPinned),
            }
        }
        ExtractedDecision::Merge { source_memory_id, target_memory_id, merged_content } => {
            let Some(mut target) = memory_crud::get_memory(conn, &target_memory_id)? else {
                return Ok(ApplyDecisionOutcome::NotFound);
            };
            if target.pinned {
                return Ok(ApplyDecisionOutcome::SkippedPinned);
            }
            // Check the source is actually forgeable before mutating the
            // target, so a pinned source leaves both rows untouched
            // instead of half-applying the merge.
            if let Some(source) = memory_crud::get_memory(conn, &source_memory_id)? {
                if source.pinned && ctx.actor_type == ActorType::Pipeline {
                    return Ok(ApplyDecisionOutcome::SkippedPinned);
                }
            }
            let normalized = signet_core::memory::normalize_content(&merged_content);
            let hash = signet_core::memory::content_hash(&normalized);
            let old_content = target.content.clone();
            target.content = merged_content;
            target.normalized_content = normalized;
            target.content_hash = hash;
            target.version += 1;
            target.updated_at = now;
            memory_crud::replace_memory(conn, &target)?;
            vector_search::delete_embeddings_for_source(conn, &target.id)?;
            history::record_event(
                conn, &target.id, HistoryEvent::Merged, Some(&old_content), Some(&target.content),
                None, Some("extraction_merge"), &json!({ "merged_from": source_memory_id }), ctx, now,
            )?;

            let source_outcome = forget(conn, &source_memory_id, true, None, ctx, now)?;
            if source_outcome == ForgetOutcome::AutonomousForceDenied {
                return Ok(ApplyDecisionOutcome::SkippedPinned);
            }
            Ok(ApplyDecisionOutcome::Applied)
        }
    }
}

/// Batch access bump (spec §4.C "FinalizeAccess"). Failures here are
/// logged but never fail the originating recall query — the caller is
/// expected to swallow the `Err` and log, not propagate it.
pub fn finalize_access(conn: &Connection, ids: &[String], now: DateTime<Utc>) -> SignetResult<()> {
    memory_crud::finalize_access(conn, ids, now)
}

/// Resolve entity names to ids, creating any that don't exist, and
/// record mentions for a memory (used by the extraction worker after
/// `ingest`/`apply_decision`, spec §4.H step 3).
pub fn record_entity_mentions(conn: &Connection, memory_id: &str, entity_names: &[String], entity_type: &str) -> SignetResult<()> {
    for name in entity_names {
        let entity_id = entities::upsert_entity(conn, name, entity_type)?;
        entities::add_mention(conn, memory_id, &entity_id)?;
    }
    Ok(())
}
