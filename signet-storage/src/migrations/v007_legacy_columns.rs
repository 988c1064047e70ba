//! v007: additive columns for databases created before a given column
//! existed. `ALTER TABLE ADD COLUMN` only — never a destructive rewrite
//! (spec §4.A: "Missing columns on legacy databases are additively
//! added via `ALTER TABLE`").

use rusqlite::Connection;
use signet_core::errors::{to_storage_err, SignetResult};

fn has_column(conn: &Connection, table: &str, column: &str) -> SignetResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let found = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| to_storage_err(e.to_string()))?
        .filter_map(Result::ok)
        .any(|name| name == column);
    Ok(found)
}

fn add_column_if_missing(conn: &Connection, table: &str, column: &str, ddl: &str) -> SignetResult<()> {
    if !has_column(conn, table, column)? {
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {ddl}"))
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn migrate(conn: &Connection) -> SignetResult<()> {
    add_column_if_missing(conn, "memories", "embedding_model", "embedding_model TEXT")?;
    add_column_if_missing(conn, "memories", "extraction_model", "extraction_model TEXT")?;
    add_column_if_missing(conn, "memory_jobs", "attempts", "attempts INTEGER NOT NULL DEFAULT 0")?;
    Ok(())
}
