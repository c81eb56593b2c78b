//! Versioned schema migrations for the DuckDB backend.
//!
//! Applied versions are recorded in `schema_version`. Each migration runs in
//! its own transaction together with its version row, so a failed migration
//! leaves the schema at the previous version.

use crate::error::{StorageError, StorageResult};
use chrono::Utc;
use duckdb::{params, Connection, Transaction};
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    up: fn(&Transaction<'_>) -> StorageResult<()>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create lockbox tables",
    up: up_1_create_lockbox_tables,
}];

/// Highest version this build knows how to migrate to.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// The schema version currently recorded in the database (0 if none).
pub fn current_version(conn: &Connection) -> StorageResult<i64> {
    let has_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    if has_table == 0 {
        return Ok(0);
    }

    let version: Option<i64> = conn.query_row(
        "SELECT MAX(version_number) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version.unwrap_or(0))
}

/// Applies every pending migration. Safe to call on an up-to-date database.
pub fn migrate_to_latest(conn: &mut Connection) -> StorageResult<i64> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version_number BIGINT PRIMARY KEY,
            migrated_at BIGINT NOT NULL
        );",
    )?;

    let mut version = current_version(conn)?;
    if version > latest_version() {
        return Err(StorageError::Migration(format!(
            "database schema version {version} is newer than supported version {}",
            latest_version()
        )));
    }

    for migration in MIGRATIONS.iter().filter(move |m| m.version > version) {
        let tx = conn.transaction()?;
        (migration.up)(&tx)?;
        tx.execute(
            "INSERT INTO schema_version (version_number, migrated_at) VALUES (?, ?)",
            params![migration.version, Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;

        info!(version = migration.version, name = migration.name, "Schema migration applied");
        version = migration.version;
    }

    Ok(version)
}

fn up_1_create_lockbox_tables(tx: &Transaction<'_>) -> StorageResult<()> {
    // Uniqueness of (repository_id, entry_guid) is kept by the store's
    // delete-then-insert inside one transaction.
    tx.execute_batch(
        r#"
        CREATE TABLE lockbox_repository (
            id BIGINT PRIMARY KEY,
            name VARCHAR NOT NULL UNIQUE,
            global_salt BLOB
        );

        CREATE TABLE lockbox_entry (
            repository_id BIGINT NOT NULL,
            entry_guid VARCHAR NOT NULL,
            key_hash VARCHAR NOT NULL,
            encrypted_key_bytes BLOB NOT NULL,
            key_iv BLOB NOT NULL,
            encrypted_value_bytes BLOB NOT NULL,
            value_iv BLOB NOT NULL,
            value_type INTEGER NOT NULL
        );

        CREATE INDEX idx_lockbox_entry_key_hash ON lockbox_entry(repository_id, key_hash);
        "#,
    )?;
    Ok(())
}
