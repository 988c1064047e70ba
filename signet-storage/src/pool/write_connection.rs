//! The single write connection. Every mutation serializes through this
//! one `Mutex<Connection>` — single-writer discipline (spec §4.B, §5).

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

use super::pragmas::apply_pragmas;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> SignetResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> SignetResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run a closure against the writer without an explicit transaction
    /// wrapper — used for migrations and single-statement maintenance
    /// where the closure manages its own `unchecked_transaction` if needed.
    pub fn with_conn_sync<F, T>(&self, f: F) -> SignetResult<T>
    where
        F: FnOnce(&Connection) -> SignetResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("writer lock poisoned: {e}")))?;
        f(&guard)
    }

    /// Run a closure inside a `BEGIN IMMEDIATE` transaction. Commits on
    /// `Ok`, rolls back on `Err` — the shape every transaction closure in
    /// `signet_storage::tx` is built on (spec §4.B: "commit on normal
    /// return and roll back on any raised error").
    pub fn with_write_tx<F, T>(&self, f: F) -> SignetResult<T>
    where
        F: FnOnce(&Connection) -> SignetResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("writer lock poisoned: {e}")))?;
        guard
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(format!("begin immediate: {e}")))?;

        match f(&guard) {
            Ok(value) => {
                guard
                    .execute_batch("COMMIT")
                    .map_err(|e| to_storage_err(format!("commit: {e}")))?;
                Ok(value)
            }
            Err(e) => {
                let _ = guard.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
