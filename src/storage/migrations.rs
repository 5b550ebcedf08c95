#![allow(clippy::cast_possible_wrap)]
// SQLite uses i64; timestamps are u64 but well within i64 range

use rusqlite::Connection;

use super::StorageError;
use crate::time::now_unix;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("sql/001_settings.sql"),
}];

pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _schema (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM _schema", [], |row| {
            row.get(0)
        })?;

    for migration in MIGRATIONS {
        if migration.version > current {
            conn.execute_batch(migration.sql)
                .map_err(|e| StorageError::Migration {
                    version: migration.version,
                    error: e.to_string(),
                })?;

            conn.execute(
                "INSERT INTO _schema (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now_unix() as i64],
            )?;
        }
    }

    Ok(())
}
