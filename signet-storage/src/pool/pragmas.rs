//! SQLite PRAGMA settings applied when a connection is opened.
//!
//! The writer gets the full set (WAL, NORMAL sync, a larger mmap and
//! page cache, incremental auto_vacuum); read-only pool members only
//! need the busy timeout and a smaller cache, since journal_mode is a
//! database-wide setting the writer already established.

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

const BUSY_TIMEOUT_MS: i64 = 5_000;
const WRITER_MMAP_BYTES: i64 = 256 * 1024 * 1024;
const WRITER_CACHE_KB: i64 = 64_000;
const READER_CACHE_KB: i64 = 32_000;

/// Full pragma set for the single write connection.
pub fn apply_pragmas(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA mmap_size = {WRITER_MMAP_BYTES};
        PRAGMA cache_size = -{WRITER_CACHE_KB};
        PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};
        PRAGMA foreign_keys = ON;
        PRAGMA auto_vacuum = INCREMENTAL;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Pragma set for a read-only pool connection.
pub fn apply_read_pragmas(conn: &Connection) -> SignetResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};
        PRAGMA cache_size = -{READER_CACHE_KB};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))
}

/// True once the writer has switched the database file to WAL mode.
pub fn verify_wal_mode(conn: &Connection) -> SignetResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_file_backed_connection_reports_wal_after_apply_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragma-test.db");
        let conn = Connection::open(&path).unwrap();
        apply_pragmas(&conn).unwrap();
        assert!(verify_wal_mode(&conn).unwrap());
    }
}
