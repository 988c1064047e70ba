//! FTS5 BM25 keyword search with the active-memory filter set from
//! spec §4.G step 1.

use chrono::{DateTime, Utc};
use rusqlite::ToSql;

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::memory::Memory;

use super::memory_crud::{row_to_memory, SELECT_COLUMNS_FTS};

/// Filters accepted by both keyword and hybrid recall (spec §4.G).
#[derive(Debug, Clone, Default)]
pub struct RecallFilters {
    pub memory_type: Option<String>,
    pub tags: Vec<String>,
    pub who: Option<String>,
    pub pinned: Option<bool>,
    pub importance_min: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

fn push_filter_clauses(filters: &RecallFilters, sql: &mut String, args: &mut Vec<Box<dyn ToSql>>) {
    if let Some(t) = &filters.memory_type {
        sql.push_str(" AND m.memory_type = ?");
        args.push(Box::new(t.clone()));
    }
    for tag in &filters.tags {
        sql.push_str(" AND m.tags LIKE ?");
        args.push(Box::new(format!("%{tag}%")));
    }
    if let Some(who) = &filters.who {
        sql.push_str(" AND m.who = ?");
        args.push(Box::new(who.clone()));
    }
    if let Some(pinned) = filters.pinned {
        sql.push_str(" AND m.pinned = ?");
        args.push(Box::new(pinned as i64));
    }
    if let Some(min) = filters.importance_min {
        sql.push_str(" AND m.importance >= ?");
        args.push(Box::new(min));
    }
    if let Some(since) = filters.since {
        sql.push_str(" AND m.created_at >= ?");
        args.push(Box::new(since.to_rfc3339()));
    }
    if let Some(until) = filters.until {
        sql.push_str(" AND m.created_at <= ?");
        args.push(Box::new(until.to_rfc3339()));
    }
}

/// BM25 keyword pass. Returns `(memory, raw_bm25_score)`; raw scores
/// are negative-is-better per SQLite's `bm25()` convention — callers
/// min-max normalize within the batch (spec §4.G step 1).
pub fn search_fts(
    conn: &rusqlite::Connection,
    query: &str,
    filters: &RecallFilters,
    limit: usize,
) -> SignetResult<Vec<(Memory, f64)>> {
    let mut sql = format!(
        "SELECT {SELECT_COLUMNS_FTS}, bm25(memories_fts) as score
         FROM memories_fts
         JOIN memories m ON m.rowid = memories_fts.rowid
         WHERE memories_fts MATCH ? AND m.is_deleted = 0"
    );
    let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(query.to_string())];
    push_filter_clauses(filters, &mut sql, &mut args);
    sql.push_str(" ORDER BY score ASC LIMIT ?");
    args.push(Box::new(limit as i64));

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params_ref: Vec<&dyn ToSql> = args.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), |row| {
            let score: f64 = row.get(24)?;
            Ok((row_to_memory(row)?, score))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

/// The plain `GET /memory/search` keyword shortcut (no vector pass),
/// same filter set, ordered purely by bm25.
pub fn search_fts_simple(
    conn: &rusqlite::Connection,
    query: &str,
    filters: &RecallFilters,
    limit: usize,
) -> SignetResult<Vec<Memory>> {
    search_fts(conn, query, filters, limit).map(|rows| rows.into_iter().map(|(m, _)| m).collect())
}

pub fn rebuild_fts(conn: &rusqlite::Connection) -> SignetResult<()> {
    conn.execute_batch("INSERT INTO memories_fts(memories_fts) VALUES ('rebuild')")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn fts_row_count(conn: &rusqlite::Connection) -> SignetResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM memories_fts", [], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}
