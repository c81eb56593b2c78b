//! Entry stores for the lockbox secret store.
//!
//! Defines the [`EntryStore`] contract the lockbox engine talks to, the
//! [`Entry`] model it persists, and two backends:
//!
//! - [`InMemoryEntryStore`]: two maps behind one mutex
//! - [`DuckDbEntryStore`]: DuckDB tables with versioned schema migrations,
//!   several named repositories per database file
//!
//! Stores only ever see ciphertext, IVs and salted key hashes.

mod config;
mod duckdb_store;
mod entry;
mod error;
mod memory;
pub mod migrations;

pub use config::StoreConfig;
pub use duckdb_store::DuckDbEntryStore;
pub use entry::{EncryptedBlock, Entry, EntryStore, ValueType};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryEntryStore;

use std::path::{Path, PathBuf};
use tracing::warn;

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. An unclean shutdown can leave
/// a WAL file behind that prevents reopening.
pub fn open_duckdb_with_wal_recovery(
    path: &Path,
    config: &StoreConfig,
) -> StorageResult<duckdb::Connection> {
    config.validate()?;
    let conn = open_with_wal_retry(path, |p| duckdb::Connection::open(p))?;
    apply_resource_limits(&conn, config)?;
    Ok(conn)
}

/// Path of the write-ahead log DuckDB keeps next to `path`.
pub fn wal_path(path: &Path) -> PathBuf {
    path.with_extension(
        path.extension()
            .map(|ext| format!("{}.wal", ext.to_string_lossy()))
            .unwrap_or_else(|| "wal".to_string()),
    )
}

fn open_with_wal_retry<C>(
    path: &Path,
    open: impl Fn(&Path) -> duckdb::Result<C>,
) -> StorageResult<C> {
    match open(path) {
        Ok(c) => Ok(c),
        Err(first_err) => {
            let wal = wal_path(path);
            if !wal.exists() {
                return Err(first_err.into());
            }
            warn!(
                wal = %wal.display(),
                error = %first_err,
                "DuckDB open failed, removing stale WAL and retrying"
            );
            std::fs::remove_file(&wal)?;
            Ok(open(path)?)
        }
    }
}

fn apply_resource_limits(conn: &duckdb::Connection, config: &StoreConfig) -> StorageResult<()> {
    // memory_limit was checked by StoreConfig::validate
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        config.memory_limit, config.threads
    ))?;
    Ok(())
}
