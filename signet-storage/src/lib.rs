//! SQLite persistence layer: connection pool, migrations, row-level
//! queries, and the transaction closures built on top of them.
//!
//! Everything above this crate talks to the store through an
//! [`Accessor`] — never a raw `rusqlite::Connection` — so the
//! single-writer/multi-reader discipline (spec §4.B) can't be bypassed.

pub mod migrations;
pub mod pool;
pub mod queries;
pub mod tx;

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use signet_core::errors::SignetResult;

use pool::ConnectionPool;

/// Process-wide handle to the memory store. Cheap to clone (wraps an
/// `Arc` internally via `Accessor::init`'s return type); every crate
/// above `signet-storage` holds one of these rather than a connection.
pub struct Accessor {
    pool: ConnectionPool,
    /// Readers opened against an in-memory writer see an empty,
    /// separate database, so in-memory accessors route reads through
    /// the writer connection instead of the read pool.
    in_memory: bool,
}

impl Accessor {
    /// Open (creating if absent) the database at `db_path`, apply
    /// pragmas, and run any pending migrations inside one write
    /// transaction. Failure aborts startup (spec §4.A).
    pub fn init(db_path: &Path) -> SignetResult<Arc<Self>> {
        let pool = ConnectionPool::open(db_path, pool::read_pool::ReadPool::default_size())?;
        let accessor = Self { pool, in_memory: false };
        accessor.run_migrations()?;
        Ok(Arc::new(accessor))
    }

    /// In-memory accessor for tests: one writer connection, reads are
    /// routed through it rather than through isolated in-memory readers.
    pub fn init_in_memory() -> SignetResult<Arc<Self>> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let accessor = Self { pool, in_memory: true };
        accessor.run_migrations()?;
        Ok(Arc::new(accessor))
    }

    fn run_migrations(&self) -> SignetResult<()> {
        self.pool.writer.with_conn_sync(|conn| migrations::run_migrations(conn))
    }

    /// Run a closure against a read-only connection. Never blocked by
    /// an in-flight writer transaction under WAL mode.
    pub fn with_read_db<F, T>(&self, f: F) -> SignetResult<T>
    where
        F: FnOnce(&Connection) -> SignetResult<T>,
    {
        if self.in_memory {
            self.pool.writer.with_conn_sync(f)
        } else {
            self.pool.readers.with_conn(f)
        }
    }

    /// Run a closure inside a `BEGIN IMMEDIATE` write transaction.
    /// Commits on `Ok`, rolls back on `Err` (spec §4.B).
    pub fn with_write_tx<F, T>(&self, f: F) -> SignetResult<T>
    where
        F: FnOnce(&Connection) -> SignetResult<T>,
    {
        self.pool.writer.with_write_tx(f)
    }

    /// Best-effort shutdown hook; `rusqlite::Connection` already closes
    /// on drop, this exists as an explicit call site for the daemon's
    /// graceful-shutdown sequence (spec §9).
    pub fn close(&self) -> SignetResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            let _ = conn.execute_batch("PRAGMA optimize;");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_core::history::{ActorType, MutationContext};
    use signet_core::memory::{content_hash, normalize_content, ExtractionStatus, Memory, MemoryKind};
    use chrono::Utc;

    fn sample_memory(id: &str, content: &str) -> Memory {
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
    fn init_in_memory_runs_migrations_and_round_trips_a_write() {
        let accessor = Accessor::init_in_memory().unwrap();
        let ctx = MutationContext::new(ActorType::Operator);
        let now = Utc::now();
        let memory = sample_memory("m1", "rotate keys weekly");

        let outcome = accessor
            .with_write_tx(|conn| tx::ingest(conn, memory, &ctx, now))
            .unwrap();
        assert!(matches!(outcome, tx::IngestOutcome::Inserted(_)));

        let fetched = accessor
            .with_read_db(|conn| queries::memory_crud::get_memory(conn, "m1"))
            .unwrap()
            .unwrap();
        assert_eq!(fetched.content, "rotate keys weekly");
    }

    #[test]
    fn close_does_not_error_on_a_fresh_store() {
        let accessor = Accessor::init_in_memory().unwrap();
        accessor.close().unwrap();
    }
}
