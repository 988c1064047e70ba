//! v006: `session_candidates`, the per-session memo of recall hits
//! (spec §3 "Session candidate record").

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS session_candidates (
            session_key TEXT NOT NULL,
            memory_id   TEXT NOT NULL,
            score       REAL NOT NULL,
            source      TEXT NOT NULL,
            injected    INTEGER NOT NULL DEFAULT 0,
            fts_hit     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (session_key, memory_id)
        );

        CREATE INDEX IF NOT EXISTS idx_session_candidates_session_key ON session_candidates(session_key);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
