//! Append-only audit log writes (spec §3 "Memory history event").
//! Immutable after insert — no update/delete helpers by design.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde_json::Value;

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::history::{ActorType, HistoryEvent, MutationContext};

#[allow(clippy::too_many_arguments)]
pub fn record_event(
    conn: &rusqlite::Connection,
    memory_id: &str,
    event: HistoryEvent,
    old_content: Option<&str>,
    new_content: Option<&str>,
    changed_by: Option<&str>,
    reason: Option<&str>,
    metadata: &Value,
    ctx: &MutationContext,
    now: DateTime<Utc>,
) -> SignetResult<()> {
    conn.execute(
        "INSERT INTO memory_history_events
            (memory_id, event, old_content, new_content, changed_by, reason, metadata,
             actor_type, session_id, request_id, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            memory_id,
            event.as_str(),
            old_content,
            new_content,
            changed_by,
            reason,
            metadata.to_string(),
            ctx.actor_type.as_str(),
            ctx.session_id,
            ctx.request_id,
            now.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// A synthetic history event for a repair action that isn't tied to a
/// single memory (`memory_id = "system"`, spec §4.J).
pub fn record_system_event(
    conn: &rusqlite::Connection,
    action: &str,
    affected: usize,
    actor: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> SignetResult<()> {
    let metadata = serde_json::json!({ "action": action, "affected": affected });
    record_event(
        conn,
        "system",
        HistoryEvent::None,
        None,
        None,
        Some(actor),
        Some(reason),
        &metadata,
        &MutationContext::new(ActorType::Operator),
        now,
    )
}
