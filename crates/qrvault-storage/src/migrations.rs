//! Database schema migrations

use crate::{Error, Result};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::debug!(
        "Running migrations: current_version={}, target_version={}",
        current_version,
        SCHEMA_VERSION
    );

    if current_version > SCHEMA_VERSION {
        return Err(Error::Migration(format!(
            "database schema {} is newer than supported {}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Schema version recorded in the database (0 when unversioned)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result = conn.query_row(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(v) => Ok(v),
        Err(_) => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;
    let rows = conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    if rows > 0 {
        tracing::debug!("Inserted schema version {}", version);
    }
    Ok(())
}

/// Apply one migration step atomically with its version bump
fn apply(conn: &Connection, version: i32, sql: &str) -> Result<()> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = conn
        .execute_batch(sql)
        .map_err(|e| Error::Migration(format!("v{}: {}", version, e)))
        .and_then(|_| set_schema_version(conn, version));

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            tracing::info!("Applied schema migration v{}", version);
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// v1: record table
fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        1,
        r#"
        CREATE TABLE IF NOT EXISTS qr_records (
            id TEXT PRIMARY KEY NOT NULL,
            label TEXT NOT NULL,
            ciphertext BLOB NOT NULL,
            date_added TEXT NOT NULL,
            cached_type TEXT
        );
        "#,
    )
}

/// v2: list views order by insertion date
fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        2,
        r#"
        CREATE INDEX IF NOT EXISTS idx_qr_records_date_added
            ON qr_records(date_added);
        "#,
    )
}
