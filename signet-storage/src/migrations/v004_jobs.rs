//! v004: `memory_jobs`, the extraction lease queue.

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_jobs (
            id          TEXT PRIMARY KEY,
            memory_id   TEXT NOT NULL,
            job_type    TEXT NOT NULL DEFAULT 'extract',
            status      TEXT NOT NULL DEFAULT 'pending',
            attempts    INTEGER NOT NULL DEFAULT 0,
            leased_at   TEXT,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_status ON memory_jobs(status);
        CREATE INDEX IF NOT EXISTS idx_jobs_memory_id ON memory_jobs(memory_id);
        CREATE INDEX IF NOT EXISTS idx_jobs_leased_at ON memory_jobs(leased_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
