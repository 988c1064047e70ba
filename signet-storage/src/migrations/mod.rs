//! Deterministic migration list, applied in order inside one write
//! transaction at `Accessor::init` (spec §4.A). A migration that fails
//! aborts daemon startup — see `signet_core::errors::StorageError::MigrationFailed`.

pub mod v001_memories;
pub mod v002_fts;
pub mod v003_embeddings;
pub mod v004_jobs;
pub mod v005_entities;
pub mod v006_session;
pub mod v007_legacy_columns;

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetError, SignetResult};
use signet_core::errors::StorageError;

struct NamedMigration {
    version: u32,
    name: &'static str,
    run: fn(&Connection) -> SignetResult<()>,
}

const MIGRATIONS: &[NamedMigration] = &[
    NamedMigration { version: 1, name: "memories", run: v001_memories::migrate },
    NamedMigration { version: 2, name: "fts", run: v002_fts::migrate },
    NamedMigration { version: 3, name: "embeddings", run: v003_embeddings::migrate },
    NamedMigration { version: 4, name: "jobs", run: v004_jobs::migrate },
    NamedMigration { version: 5, name: "entities", run: v005_entities::migrate },
    NamedMigration { version: 6, name: "session", run: v006_session::migrate },
    NamedMigration { version: 7, name: "legacy_columns", run: v007_legacy_columns::migrate },
];

pub fn run_migrations(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL)")
        .map_err(|e| to_storage_err(e.to_string()))?;

    for m in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                [m.version],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if already {
            continue;
        }
        (m.run)(conn).map_err(|e| {
            tracing::error!(version = m.version, name = m.name, error = %e, "migration failed");
            SignetError::Storage(StorageError::MigrationFailed {
                version: m.version,
                reason: e.to_string(),
            })
        })?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            [m.version],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        tracing::info!(version = m.version, name = m.name, "migration applied");
    }
    Ok(())
}
