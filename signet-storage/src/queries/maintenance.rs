//! Store-wide maintenance reads/writes backing the repair layer and
//! diagnostics (spec §4.J, §4.M).

use chrono::{DateTime, Utc};
use rusqlite::params;

use signet_core::errors::{to_storage_err, SignetResult};

use super::memory_crud::count_active;
use super::memory_search::fts_row_count;

/// `(active_count, fts_count, mismatch_ratio)`.
pub fn fts_consistency(conn: &rusqlite::Connection) -> SignetResult<(i64, i64, f64)> {
    let active = count_active(conn)?;
    let fts = fts_row_count(conn)?;
    let ratio = if active == 0 {
        0.0
    } else {
        ((active - fts).unsigned_abs()) as f64 / active as f64
    };
    Ok((active, fts, ratio))
}

/// Hard-delete soft-deleted rows (and their embeddings) past the
/// retention window, one batch per call (spec §5 "Retention window").
pub fn sweep_retention(conn: &rusqlite::Connection, window_ms: i64, now: DateTime<Utc>, batch_size: usize) -> SignetResult<usize> {
    let cutoff = now - chrono::Duration::milliseconds(window_ms);
    let ids: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT id FROM memories WHERE is_deleted = 1 AND deleted_at < ?1 LIMIT ?2")
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![cutoff.to_rfc3339(), batch_size as i64], |r| r.get(0))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        rows
    };
    for id in &ids {
        conn.execute("DELETE FROM embeddings WHERE source_id = ?1", params![id])
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute("DELETE FROM vec_embeddings WHERE source_id = ?1", params![id])
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute("DELETE FROM entity_mentions WHERE memory_id = ?1", params![id])
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute("DELETE FROM memories WHERE id = ?1", params![id])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(ids.len())
}

pub fn incremental_vacuum(conn: &rusqlite::Connection) -> SignetResult<()> {
    conn.execute_batch("PRAGMA incremental_vacuum;")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Embeddings whose dimensions don't match the configured value.
pub fn count_dimension_mismatches(conn: &rusqlite::Connection, expected: usize) -> SignetResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM embeddings WHERE dimensions != ?1",
        params![expected as i64],
        |r| r.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Distinct non-null `embedding_model` values currently recorded.
pub fn distinct_embedding_models(conn: &rusqlite::Connection) -> SignetResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT embedding_model FROM memories WHERE embedding_model IS NOT NULL")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_null_or_empty_vectors(conn: &rusqlite::Connection) -> SignetResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM embeddings WHERE vector IS NULL OR length(vector) = 0", [], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

pub fn embeddings_vec_index_parity(conn: &rusqlite::Connection) -> SignetResult<(i64, i64)> {
    let embeddings: i64 = conn
        .query_row("SELECT COUNT(*) FROM embeddings", [], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let vec_index: i64 = conn
        .query_row("SELECT COUNT(*) FROM vec_embeddings", [], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok((embeddings, vec_index))
}

/// Active memories that have at least one embedding row (spec §4.M
/// "embedding coverage").
pub fn count_embedded_active(conn: &rusqlite::Connection) -> SignetResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM memories m
         WHERE m.is_deleted = 0 AND EXISTS (SELECT 1 FROM embeddings e WHERE e.source_id = m.id)",
        [],
        |r| r.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_orphaned_embeddings(conn: &rusqlite::Connection) -> SignetResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM embeddings e
         WHERE NOT EXISTS (SELECT 1 FROM memories m WHERE m.id = e.source_id AND m.is_deleted = 0)",
        [],
        |r| r.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
