//! Pool of read-only connections, handed out round-robin. Readers never
//! block on the writer thanks to WAL's reader/writer isolation, so this
//! pool exists purely to spread concurrent reads across more than one
//! `Connection` (SQLite connections aren't `Sync`).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

use super::pragmas::apply_read_pragmas;

const DEFAULT_POOL_SIZE: usize = 4;
const MAX_POOL_SIZE: usize = 8;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, pool_size: usize) -> SignetResult<Self> {
        Self::build(pool_size, || {
            Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        })
    }

    /// In-memory pool for tests. Each slot is its own isolated database
    /// (there's no file to share), so a test exercising both the
    /// writer and this pool should route reads through the writer
    /// instead — see `Accessor::use_read_pool`.
    pub fn open_in_memory(pool_size: usize) -> SignetResult<Self> {
        Self::build(pool_size, Connection::open_in_memory)
    }

    fn build<F>(pool_size: usize, mut open_one: F) -> SignetResult<Self>
    where
        F: FnMut() -> rusqlite::Result<Connection>,
    {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = open_one().map_err(|e| to_storage_err(e.to_string()))?;
            apply_read_pragmas(&conn)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> SignetResult<T>
    where
        F: FnOnce(&Connection) -> SignetResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx]
            .lock()
            .map_err(|e| to_storage_err(format!("read pool lock poisoned: {e}")))?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn default_size() -> usize {
        DEFAULT_POOL_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_clamped_to_the_configured_maximum() {
        let pool = ReadPool::open_in_memory(99).unwrap();
        assert_eq!(pool.size(), MAX_POOL_SIZE);
    }

    #[test]
    fn pool_size_is_clamped_to_at_least_one() {
        let pool = ReadPool::open_in_memory(0).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn with_conn_cycles_through_every_slot() {
        let pool = ReadPool::open_in_memory(3).unwrap();
        for _ in 0..(pool.size() * 2) {
            pool.with_conn(|conn| {
                let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
                assert_eq!(one, 1);
                Ok(())
            })
            .unwrap();
        }
    }
}
