//! v003: `embeddings` and its lockstep mirror `vec_embeddings`.
//!
//! `vec_embeddings` is a plain indexed table rather than a `sqlite-vec`
//! virtual table — similarity search only needs a bounded brute-force
//! cosine scan (spec §4.G step 2), so the extra vtab dependency buys
//! nothing here.

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS embeddings (
            id           TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL UNIQUE,
            vector       BLOB NOT NULL,
            dimensions   INTEGER NOT NULL,
            source_type  TEXT NOT NULL DEFAULT 'memory',
            source_id    TEXT NOT NULL,
            chunk_text   TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_embeddings_source_id ON embeddings(source_id);

        CREATE TABLE IF NOT EXISTS vec_embeddings (
            id         TEXT PRIMARY KEY,
            source_id  TEXT NOT NULL,
            dims       INTEGER NOT NULL,
            vector     BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_vec_embeddings_source_id ON vec_embeddings(source_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
