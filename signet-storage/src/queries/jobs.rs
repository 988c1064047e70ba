//! The extraction lease queue (spec §3 "Memory job", §4.H).

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::job::{JobStatus, MemoryJob};

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<MemoryJob> {
    let status: String = row.get(3)?;
    let leased_at: Option<String> = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(MemoryJob {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        job_type: row.get(2)?,
        status: JobStatus::from(status.as_str()),
        attempts: row.get::<_, i64>(4)? as u32,
        leased_at: leased_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub fn enqueue_extraction(conn: &rusqlite::Connection, memory_id: &str, now: DateTime<Utc>) -> SignetResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO memory_jobs (id, memory_id, job_type, status, attempts, leased_at, updated_at)
         VALUES (?1, ?2, 'extract', 'pending', 0, NULL, ?3)",
        params![id, memory_id, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(id)
}

/// Atomically claim the oldest pending job, or a leased job whose lease
/// has expired. Returns `None` when there's nothing to do.
pub fn claim_next_job(
    conn: &rusqlite::Connection,
    lease_timeout_ms: i64,
    now: DateTime<Utc>,
) -> SignetResult<Option<MemoryJob>> {
    let stale_before = now - chrono::Duration::milliseconds(lease_timeout_ms);
    let candidate: Option<String> = conn
        .query_row(
            "SELECT id FROM memory_jobs
             WHERE status = 'pending' OR (status = 'leased' AND leased_at < ?1)
             ORDER BY updated_at ASC LIMIT 1",
            params![stale_before.to_rfc3339()],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some(job_id) = candidate else { return Ok(None) };

    conn.execute(
        "UPDATE memory_jobs SET status = 'leased', leased_at = ?2, updated_at = ?2 WHERE id = ?1",
        params![job_id, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.query_row(
        "SELECT id, memory_id, job_type, status, attempts, leased_at, updated_at FROM memory_jobs WHERE id = ?1",
        params![job_id],
        row_to_job,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Increment `attempts`; transition to `dead` once `attempts >=
/// max_retries`, else back to `pending`. Returns `true` when the job
/// went dead.
pub fn record_failure(conn: &rusqlite::Connection, job_id: &str, max_retries: u32, now: DateTime<Utc>) -> SignetResult<bool> {
    let attempts: i64 = conn
        .query_row("SELECT attempts FROM memory_jobs WHERE id = ?1", params![job_id], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let attempts = attempts + 1;
    let dead = attempts as u32 >= max_retries;
    let status = if dead { "dead" } else { "pending" };
    conn.execute(
        "UPDATE memory_jobs SET attempts = ?2, status = ?3, leased_at = NULL, updated_at = ?4 WHERE id = ?1",
        params![job_id, attempts, status, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(dead)
}

pub fn mark_done(conn: &rusqlite::Connection, job_id: &str, now: DateTime<Utc>) -> SignetResult<()> {
    conn.execute(
        "UPDATE memory_jobs SET status = 'done', updated_at = ?2 WHERE id = ?1",
        params![job_id, now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn requeue_dead_jobs(conn: &rusqlite::Connection, max_batch: usize, now: DateTime<Utc>) -> SignetResult<usize> {
    let ids: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT id FROM memory_jobs WHERE status = 'dead' LIMIT ?1")
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![max_batch as i64], |r| r.get(0))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        rows
    };
    for id in &ids {
        conn.execute(
            "UPDATE memory_jobs SET status = 'pending', attempts = 0, updated_at = ?2 WHERE id = ?1",
            params![id, now.to_rfc3339()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(ids.len())
}

pub fn release_stale_leases(conn: &rusqlite::Connection, lease_timeout_ms: i64, now: DateTime<Utc>) -> SignetResult<usize> {
    let stale_before = now - chrono::Duration::milliseconds(lease_timeout_ms);
    let affected = conn
        .execute(
            "UPDATE memory_jobs SET status = 'pending', leased_at = NULL, updated_at = ?2
             WHERE status = 'leased' AND leased_at < ?1",
            params![stale_before.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(affected)
}
