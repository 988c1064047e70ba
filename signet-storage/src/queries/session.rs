//! Persisted side of session & continuity tracking: `session_candidates`
//! (spec §3, §4.K). The in-memory ring-buffer half lives in
//! `signet_core::session` and is owned by `signet-session`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::session::SessionCandidateRecord;

fn row_to_candidate(row: &Row<'_>) -> rusqlite::Result<SessionCandidateRecord> {
    let created_at: String = row.get(6)?;
    let injected: i64 = row.get(4)?;
    let fts_hit: i64 = row.get(5)?;
    Ok(SessionCandidateRecord {
        session_key: row.get(0)?,
        memory_id: row.get(1)?,
        score: row.get(2)?,
        source: row.get(3)?,
        injected: injected != 0,
        fts_hit: fts_hit != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub fn record_candidate(conn: &rusqlite::Connection, rec: &SessionCandidateRecord) -> SignetResult<()> {
    conn.execute(
        "INSERT INTO session_candidates (session_key, memory_id, score, source, injected, fts_hit, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7)
         ON CONFLICT(session_key, memory_id) DO UPDATE SET
            score = excluded.score, source = excluded.source, injected = excluded.injected",
        params![
            rec.session_key,
            rec.memory_id,
            rec.score,
            rec.source,
            rec.injected as i64,
            rec.fts_hit as i64,
            rec.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn candidates_for_session(conn: &rusqlite::Connection, session_key: &str) -> SignetResult<Vec<SessionCandidateRecord>> {
    let mut stmt = conn
        .prepare("SELECT session_key, memory_id, score, source, injected, fts_hit, created_at FROM session_candidates WHERE session_key = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![session_key], row_to_candidate)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

/// Flag which of the given memory ids were later re-hit by a keyword
/// search within this session (spec §4.K `trackFtsHits`).
pub fn mark_fts_hits(conn: &rusqlite::Connection, session_key: &str, memory_ids: &[String]) -> SignetResult<usize> {
    if memory_ids.is_empty() {
        return Ok(0);
    }
    let placeholders = memory_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
        "UPDATE session_candidates SET fts_hit = 1 WHERE session_key = ? AND memory_id IN ({placeholders})"
    );
    let mut params: Vec<&dyn rusqlite::ToSql> = vec![&session_key];
    for id in memory_ids {
        params.push(id);
    }
    conn.execute(&sql, params.as_slice()).map_err(|e| to_storage_err(e.to_string()))
}
