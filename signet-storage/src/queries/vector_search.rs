//! Brute-force cosine search over `vec_embeddings`, plus the upsert
//! path that keeps `embeddings` and `vec_embeddings` in lockstep
//! (spec §3 "a parallel vector-index table stays in lockstep").

use chrono::Utc;
use rusqlite::params;

use signet_core::embedding::{cosine_similarity, pack_vector, unpack_vector};
use signet_core::errors::{to_storage_err, SignetResult};

use super::memory_crud::SELECT_COLUMNS_FTS;
use signet_core::memory::Memory;

/// Nearest neighbors of a query vector among embeddings whose memory is
/// still active, optionally filtered by memory type.
pub fn search_vector(
    conn: &rusqlite::Connection,
    query: &[f32],
    limit: usize,
    memory_type: Option<&str>,
) -> SignetResult<Vec<(Memory, f64)>> {
    let mut sql = format!(
        "SELECT {SELECT_COLUMNS_FTS}, v.vector, v.dims
         FROM vec_embeddings v
         JOIN memories m ON m.id = v.source_id
         WHERE m.is_deleted = 0"
    );
    if memory_type.is_some() {
        sql.push_str(" AND m.memory_type = ?1");
    }
    sql.push_str(" LIMIT 5000"); // bounded candidate set per spec §4.G step 2

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let mut scored: Vec<(Memory, f64)> = Vec::new();

    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Memory, Vec<u8>, i64)> {
        let memory = super::memory_crud::row_to_memory(row)?;
        let blob: Vec<u8> = row.get(24)?;
        let dims: i64 = row.get(25)?;
        Ok((memory, blob, dims))
    };

    let rows: Vec<_> = if let Some(t) = memory_type {
        stmt.query_map(params![t], map_row)
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?
    } else {
        stmt.query_map([], map_row)
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?
    };

    for (memory, blob, dims) in rows {
        if dims as usize != query.len() {
            continue;
        }
        let vector = unpack_vector(&blob);
        let sim = cosine_similarity(query, &vector);
        if sim > 0.0 {
            scored.push((memory, sim));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

/// A memory's own vector, for `/memory/similar`.
pub fn get_vector_for_memory(conn: &rusqlite::Connection, memory_id: &str) -> SignetResult<Option<Vec<f32>>> {
    conn.query_row(
        "SELECT vector FROM vec_embeddings WHERE source_id = ?1",
        params![memory_id],
        |row| row.get::<_, Vec<u8>>(0),
    )
    .map(|blob| Some(unpack_vector(&blob)))
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(to_storage_err(other.to_string())),
    })
}

/// Delete any embedding rows for `source_id` whose `content_hash`
/// doesn't match `current_hash`, then upsert the new vector under
/// `current_hash`. Mirrors the change into `vec_embeddings`.
pub fn upsert_embedding(
    conn: &rusqlite::Connection,
    embedding_id: &str,
    source_id: &str,
    current_hash: &str,
    vector: &[f32],
    model_name: &str,
) -> SignetResult<()> {
    conn.execute(
        "DELETE FROM embeddings WHERE source_id = ?1 AND content_hash != ?2",
        params![source_id, current_hash],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "DELETE FROM vec_embeddings WHERE source_id = ?1 AND id NOT IN (SELECT id FROM embeddings WHERE source_id = ?1)",
        params![source_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let now = Utc::now().to_rfc3339();
    let blob = pack_vector(vector);
    conn.execute(
        "INSERT INTO embeddings (id, content_hash, vector, dimensions, source_type, source_id, chunk_text, created_at)
         VALUES (?1, ?2, ?3, ?4, 'memory', ?5, NULL, ?6)
         ON CONFLICT(content_hash) DO UPDATE SET vector = excluded.vector, dimensions = excluded.dimensions, source_id = excluded.source_id",
        params![embedding_id, current_hash, blob, vector.len() as i64, source_id, now],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO vec_embeddings (id, source_id, dims, vector) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET source_id = excluded.source_id, dims = excluded.dims, vector = excluded.vector",
        params![embedding_id, source_id, vector.len() as i64, blob],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "UPDATE memories SET embedding_model = ?2 WHERE id = ?1",
        params![source_id, model_name],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

pub fn delete_embeddings_for_source(conn: &rusqlite::Connection, source_id: &str) -> SignetResult<()> {
    conn.execute("DELETE FROM embeddings WHERE source_id = ?1", params![source_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute("DELETE FROM vec_embeddings WHERE source_id = ?1", params![source_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Memories that are active and either have no embedding, or whose
/// embedding's content_hash no longer matches the memory, or whose
/// recorded model differs from the configured one (spec §4.I step ii).
pub fn find_stale_or_missing_embeddings(
    conn: &rusqlite::Connection,
    configured_model: &str,
    limit: usize,
) -> SignetResult<Vec<Memory>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS_FTS} FROM memories m
         LEFT JOIN embeddings e ON e.source_id = m.id
         WHERE m.is_deleted = 0
           AND (e.id IS NULL OR e.content_hash != m.content_hash OR m.embedding_model IS NULL OR m.embedding_model != ?1)
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![configured_model, limit as i64], super::memory_crud::row_to_memory)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}
