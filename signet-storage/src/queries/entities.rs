//! Entity and entity-mention storage (spec §3 "Entity & entity mention").
//! Deliberately tiny — a join table, not a general graph database.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use signet_core::errors::{to_storage_err, SignetResult};
use signet_core::memory::Memory;

pub fn upsert_entity(conn: &rusqlite::Connection, name: &str, entity_type: &str) -> SignetResult<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM entities WHERE name = ?1 AND entity_type = ?2",
            params![name, entity_type],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO entities (id, name, entity_type) VALUES (?1, ?2, ?3)",
        params![id, name, entity_type],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(id)
}

pub fn add_mention(conn: &rusqlite::Connection, memory_id: &str, entity_id: &str) -> SignetResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO entity_mentions (memory_id, entity_id) VALUES (?1, ?2)",
        params![memory_id, entity_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Entity ids whose name appears (case-insensitively) in any of the
/// given query terms — the lookup side of graph boost (spec §4.G
/// step 5, "enumerate entity mentions for the query terms").
pub fn entity_ids_matching_terms(conn: &rusqlite::Connection, terms: &[String]) -> SignetResult<Vec<String>> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let clause = terms.iter().map(|_| "LOWER(name) = ?").collect::<Vec<_>>().join(" OR ");
    let sql = format!("SELECT id FROM entities WHERE {clause}");
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let args: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let rows = stmt
        .query_map(params.as_slice(), |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

/// Entity ids mentioned by any of the given memory ids.
pub fn entity_ids_for_memories(conn: &rusqlite::Connection, memory_ids: &[String]) -> SignetResult<Vec<String>> {
    if memory_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = memory_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!("SELECT DISTINCT entity_id FROM entity_mentions WHERE memory_id IN ({placeholders})");
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params: Vec<&dyn rusqlite::ToSql> = memory_ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let rows = stmt
        .query_map(params.as_slice(), |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

/// Memory ids (any type, active) that mention any of the given entities —
/// the untyped lookup graph boost needs (spec §4.G step 5).
pub fn memory_ids_mentioning_entities(conn: &rusqlite::Connection, entity_ids: &[String]) -> SignetResult<Vec<String>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = entity_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT DISTINCT em.memory_id FROM entity_mentions em
         JOIN memories m ON m.id = em.memory_id
         WHERE em.entity_id IN ({placeholders}) AND m.is_deleted = 0"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params: Vec<&dyn rusqlite::ToSql> = entity_ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let rows = stmt
        .query_map(params.as_slice(), |r| r.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

/// Memory ids (of a given type, active) that mention any of the given entities.
pub fn memories_mentioning_entities(
    conn: &rusqlite::Connection,
    entity_ids: &[String],
    memory_type: &str,
    exclude_ids: &[String],
    limit: usize,
) -> SignetResult<Vec<Memory>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let entity_placeholders = entity_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let exclude_clause = if exclude_ids.is_empty() {
        String::new()
    } else {
        let p = exclude_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        format!(" AND m.id NOT IN ({p})")
    };
    let sql = format!(
        "SELECT DISTINCT {cols} FROM entity_mentions em
         JOIN memories m ON m.id = em.memory_id
         WHERE em.entity_id IN ({entity_placeholders}) AND m.memory_type = ? AND m.is_deleted = 0{exclude_clause}
         LIMIT ?",
        cols = super::memory_crud::SELECT_COLUMNS_FTS,
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = entity_ids.iter().map(|s| Box::new(s.clone()) as Box<dyn rusqlite::ToSql>).collect();
    params.push(Box::new(memory_type.to_string()));
    for id in exclude_ids {
        params.push(Box::new(id.clone()));
    }
    params.push(Box::new(limit as i64));
    let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), super::memory_crud::row_to_memory)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}
