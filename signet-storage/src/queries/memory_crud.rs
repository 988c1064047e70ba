//! Row-level CRUD for `memories`. Every write here is a single
//! statement; the transaction boundary lives one layer up in
//! `signet_storage::tx`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::memory::{split_tags, ExtractionStatus, Memory, MemoryKind};

pub(crate) const SELECT_COLUMNS: &str = "id, content, normalized_content, content_hash, memory_type, tags,
     importance, pinned, is_deleted, deleted_at, version, access_count, last_accessed,
     who, why, project, created_at, updated_at, updated_by, source_type, source_id,
     embedding_model, extraction_status, extraction_model";

/// Same columns, `m.`-qualified for queries that join `memories` against
/// another table (FTS, vector candidates).
pub(crate) const SELECT_COLUMNS_FTS: &str = "m.id, m.content, m.normalized_content, m.content_hash, m.memory_type, m.tags,
     m.importance, m.pinned, m.is_deleted, m.deleted_at, m.version, m.access_count, m.last_accessed,
     m.who, m.why, m.project, m.created_at, m.updated_at, m.updated_by, m.source_type, m.source_id,
     m.embedding_model, m.extraction_status, m.extraction_model";

pub fn row_to_memory(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let tags_joined: String = row.get(5)?;
    let deleted_at: Option<String> = row.get(9)?;
    let last_accessed: Option<String> = row.get(12)?;
    let created_at: String = row.get(16)?;
    let updated_at: String = row.get(17)?;
    let memory_type: String = row.get(4)?;
    let extraction_status: String = row.get(22)?;
    let pinned: i64 = row.get(7)?;
    let is_deleted: i64 = row.get(8)?;

    Ok(Memory {
        id: row.get(0)?,
        content: row.get(1)?,
        normalized_content: row.get(2)?,
        content_hash: row.get(3)?,
        memory_type: MemoryKind::from(memory_type.as_str()),
        tags: split_tags(&tags_joined),
        importance: row.get(6)?,
        pinned: pinned != 0,
        is_deleted: is_deleted != 0,
        deleted_at: deleted_at.and_then(|s| parse_rfc3339(&s)),
        version: row.get::<_, i64>(10)? as u64,
        access_count: row.get::<_, i64>(11)? as u64,
        last_accessed: last_accessed.and_then(|s| parse_rfc3339(&s)),
        who: row.get(13)?,
        why: row.get(14)?,
        project: row.get(15)?,
        created_at: parse_rfc3339(&created_at).unwrap_or_else(Utc::now),
        updated_at: parse_rfc3339(&updated_at).unwrap_or_else(Utc::now),
        updated_by: row.get(18)?,
        source_type: row.get(19)?,
        source_id: row.get(20)?,
        embedding_model: row.get(21)?,
        extraction_status: ExtractionStatus::from(extraction_status.as_str()),
        extraction_model: row.get(23)?,
    })
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

pub fn insert_memory(conn: &Connection, m: &Memory) -> SignetResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO memories ({SELECT_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24)"
        ),
        params![
            m.id,
            m.content,
            m.normalized_content,
            m.content_hash,
            m.memory_type.as_str(),
            signet_core::memory::join_tags(&m.tags),
            m.importance,
            m.pinned as i64,
            m.is_deleted as i64,
            m.deleted_at.map(|t| t.to_rfc3339()),
            m.version as i64,
            m.access_count as i64,
            m.last_accessed.map(|t| t.to_rfc3339()),
            m.who,
            m.why,
            m.project,
            m.created_at.to_rfc3339(),
            m.updated_at.to_rfc3339(),
            m.updated_by,
            m.source_type,
            m.source_id,
            m.embedding_model,
            m.extraction_status.as_str(),
            m.extraction_model,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_memory(conn: &Connection, id: &str) -> SignetResult<Option<Memory>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id = ?1"),
        params![id],
        row_to_memory,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn find_active_by_content_hash(conn: &Connection, hash: &str) -> SignetResult<Option<Memory>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM memories WHERE content_hash = ?1 AND is_deleted = 0"),
        params![hash],
        row_to_memory,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn replace_memory(conn: &Connection, m: &Memory) -> SignetResult<()> {
    conn.execute(
        "UPDATE memories SET content=?2, normalized_content=?3, content_hash=?4, memory_type=?5,
            tags=?6, importance=?7, pinned=?8, is_deleted=?9, deleted_at=?10, version=?11,
            access_count=?12, last_accessed=?13, who=?14, why=?15, project=?16, updated_at=?17,
            updated_by=?18, source_type=?19, source_id=?20, embedding_model=?21,
            extraction_status=?22, extraction_model=?23
         WHERE id=?1",
        params![
            m.id,
            m.content,
            m.normalized_content,
            m.content_hash,
            m.memory_type.as_str(),
            signet_core::memory::join_tags(&m.tags),
            m.importance,
            m.pinned as i64,
            m.is_deleted as i64,
            m.deleted_at.map(|t| t.to_rfc3339()),
            m.version as i64,
            m.access_count as i64,
            m.last_accessed.map(|t| t.to_rfc3339()),
            m.who,
            m.why,
            m.project,
            m.updated_at.to_rfc3339(),
            m.updated_by,
            m.source_type,
            m.source_id,
            m.embedding_model,
            m.extraction_status.as_str(),
            m.extraction_model,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn finalize_access(conn: &Connection, ids: &[String], now: DateTime<Utc>) -> SignetResult<()> {
    let mut stmt = conn
        .prepare("UPDATE memories SET access_count = access_count + 1, last_accessed = ?2 WHERE id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    for id in ids {
        stmt.execute(params![id, now.to_rfc3339()])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn set_extraction_status(conn: &Connection, id: &str, status: ExtractionStatus, model: Option<&str>) -> SignetResult<()> {
    conn.execute(
        "UPDATE memories SET extraction_status = ?2, extraction_model = ?3 WHERE id = ?1",
        params![id, status.as_str(), model],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn list_paginated(conn: &Connection, limit: i64, offset: i64) -> SignetResult<Vec<Memory>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE is_deleted = 0 ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![limit, offset], row_to_memory)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_active(conn: &Connection) -> SignetResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM memories WHERE is_deleted = 0", [], |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::write_connection::WriteConnection;
    use signet_core::memory::{content_hash, normalize_content};

    fn sample(id: &str, content: &str) -> Memory {
        let now = Utc::now();
        let normalized = normalize_content(content);
        let hash = content_hash(&normalized);
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            normalized_content: normalized,
            content_hash: hash,
            memory_type: MemoryKind::Fact,
            tags: vec![],
            importance: 0.5,
            pinned: false,
            is_deleted: false,
            deleted_at: None,
            version: 1,
            access_count: 0,
            last_accessed: None,
            who: Some("tester".into()),
            why: None,
            project: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
            source_type: None,
            source_id: None,
            embedding_model: None,
            extraction_status: ExtractionStatus::None,
            extraction_model: None,
        }
    }

    #[test]
    fn insert_and_get_round_trips() {
        let wc = WriteConnection::open_in_memory().unwrap();
        wc.with_conn_sync(|conn| {
            crate::migrations::run_migrations(conn)?;
            let m = sample("m1", "rotate keys weekly");
            insert_memory(conn, &m)?;
            let fetched = get_memory(conn, "m1")?.unwrap();
            assert_eq!(fetched.content, "rotate keys weekly");
            assert_eq!(fetched.version, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_content_hash_among_active_rows_is_rejected() {
        let wc = WriteConnection::open_in_memory().unwrap();
        let result = wc.with_conn_sync(|conn| {
            crate::migrations::run_migrations(conn)?;
            let a = sample("m1", "same content");
            let mut b = sample("m2", "same content");
            b.content_hash = a.content_hash.clone();
            insert_memory(conn, &a)?;
            insert_memory(conn, &b)
        });
        assert!(result.is_err());
    }
}
