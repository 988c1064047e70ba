//! v005: `entities` and `entity_mentions`, the small knowledge graph
//! used for the graph recall boost and decision→rationale linking.

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            entity_type TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_name_type ON entities(name, entity_type);

        CREATE TABLE IF NOT EXISTS entity_mentions (
            memory_id TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            PRIMARY KEY (memory_id, entity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_mentions_entity_id ON entity_mentions(entity_id);
        CREATE INDEX IF NOT EXISTS idx_mentions_memory_id ON entity_mentions(memory_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
