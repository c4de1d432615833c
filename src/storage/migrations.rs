/// Schema setup for the progress database
///
/// The schema is one key-value table plus a `schema_version` row recording
/// which migrations have run.

use rusqlite::{Connection, OptionalExtension};
use crate::storage::StorageError;

/// Schema version after every migration below has run
const CURRENT_VERSION: i32 = 1;

/// Ordered migrations; entry `n` brings the schema to version `n + 1`
const MIGRATIONS: [&str; 1] = [
    "CREATE TABLE IF NOT EXISTS kv_entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Bring the database up to `CURRENT_VERSION`; safe to call on every open
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let from = stored_version(conn)?;
    if from >= CURRENT_VERSION {
        return Ok(());
    }

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(from.max(0) as usize) {
        let version = index as i32 + 1;
        conn.execute(sql, [])
            .map_err(|e| StorageError::Migration(format!("v{} failed: {}", version, e)))?;
        tracing::info!("Applied schema migration v{}", version);
    }
    record_version(conn, CURRENT_VERSION)
}

/// 0 for a database that has never been migrated
fn stored_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

fn record_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}
