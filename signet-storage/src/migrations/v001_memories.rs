//! v001: the `memories` table and its companion `memory_history_events`
//! audit log.

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id                 TEXT PRIMARY KEY,
            content            TEXT NOT NULL,
            normalized_content TEXT NOT NULL,
            content_hash       TEXT NOT NULL,
            memory_type        TEXT NOT NULL,
            tags               TEXT NOT NULL DEFAULT '',
            importance         REAL NOT NULL DEFAULT 0.5,
            pinned             INTEGER NOT NULL DEFAULT 0,
            is_deleted         INTEGER NOT NULL DEFAULT 0,
            deleted_at         TEXT,
            version            INTEGER NOT NULL DEFAULT 1,
            access_count       INTEGER NOT NULL DEFAULT 0,
            last_accessed      TEXT,
            who                TEXT,
            why                TEXT,
            project            TEXT,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            updated_by         TEXT,
            source_type        TEXT,
            source_id          TEXT,
            embedding_model    TEXT,
            extraction_status  TEXT NOT NULL DEFAULT 'none',
            extraction_model   TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_content_hash_active
            ON memories(content_hash) WHERE is_deleted = 0;
        CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);
        CREATE INDEX IF NOT EXISTS idx_memories_pinned ON memories(pinned);
        CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
        CREATE INDEX IF NOT EXISTS idx_memories_updated_at ON memories(updated_at);
        CREATE INDEX IF NOT EXISTS idx_memories_tags ON memories(tags);
        CREATE INDEX IF NOT EXISTS idx_memories_is_deleted ON memories(is_deleted);

        CREATE TABLE IF NOT EXISTS memory_history_events (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            memory_id     TEXT NOT NULL,
            event         TEXT NOT NULL,
            old_content   TEXT,
            new_content   TEXT,
            changed_by    TEXT,
            reason        TEXT,
            metadata      TEXT NOT NULL DEFAULT '{}',
            actor_type    TEXT NOT NULL DEFAULT 'daemon',
            session_id    TEXT,
            request_id    TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_memory_id ON memory_history_events(memory_id);
        CREATE INDEX IF NOT EXISTS idx_history_created_at ON memory_history_events(created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
