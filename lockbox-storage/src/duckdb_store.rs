//! Relational entry store backed by DuckDB.
//!
//! One database can hold many named repositories. Every repository gets its
//! own row in `lockbox_repository` carrying the global salt, and all entry
//! queries are scoped by that row's id.

use crate::config::StoreConfig;
use crate::entry::{EncryptedBlock, Entry, EntryStore, ValueType};
use crate::error::{StorageError, StorageResult};
use crate::migrations;
use duckdb::{params, Connection};
use lockbox_crypto::GlobalSalt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Entry store for one repository inside a DuckDB database.
#[derive(Clone, Debug)]
pub struct DuckDbEntryStore {
    conn: Arc<Mutex<Connection>>,
    repository_name: String,
    repository_id: i64,
    global_salt: GlobalSalt,
}

impl DuckDbEntryStore {
    /// Opens (or creates) the database at `path` and connects to the named repository.
    pub fn open(path: &Path, repository_name: &str) -> StorageResult<Self> {
        Self::open_with_config(path, repository_name, &StoreConfig::default())
    }

    pub fn open_with_config(
        path: &Path,
        repository_name: &str,
        config: &StoreConfig,
    ) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path, config)?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)), repository_name)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory(repository_name: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)), repository_name)
    }

    /// Connects to a repository over an existing shared connection.
    ///
    /// Runs pending schema migrations first.
    pub fn open_with_conn(
        conn: Arc<Mutex<Connection>>,
        repository_name: &str,
    ) -> StorageResult<Self> {
        let (repository_id, global_salt) = {
            let mut guard = conn.lock().map_err(|e| StorageError::Lock(e.to_string()))?;
            migrations::migrate_to_latest(&mut guard)?;
            connect_repository(&mut guard, repository_name)?
        };

        Ok(Self {
            conn,
            repository_name: repository_name.to_string(),
            repository_id,
            global_salt,
        })
    }

    /// The repository's salt. Generated once when the repository was created.
    pub fn global_salt(&self) -> GlobalSalt {
        self.global_salt.clone()
    }

    pub fn repository_id(&self) -> i64 {
        self.repository_id
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| StorageError::Lock(e.to_string()))
    }
}

/// Looks up the repository by name, creating it and its salt if needed.
fn connect_repository(conn: &mut Connection, name: &str) -> StorageResult<(i64, GlobalSalt)> {
    let tx = conn.transaction()?;

    let existing = tx.query_row(
        "SELECT id, global_salt FROM lockbox_repository WHERE name = ?",
        params![name],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<Vec<u8>>>(1)?)),
    );

    let (repository_id, global_salt) = match existing {
        Ok((id, Some(bytes))) => (id, GlobalSalt::from_slice(&bytes)?),
        Ok((id, None)) => {
            let salt = GlobalSalt::random();
            tx.execute(
                "UPDATE lockbox_repository SET global_salt = ? WHERE id = ?",
                params![salt.as_bytes().to_vec(), id],
            )?;
            debug!(repository_id = id, "Global salt generated for existing repository");
            (id, salt)
        }
        Err(duckdb::Error::QueryReturnedNoRows) => {
            let next_id: i64 = tx.query_row(
                "SELECT COALESCE(MAX(id), 0) + 1 FROM lockbox_repository",
                [],
                |row| row.get(0),
            )?;
            let salt = GlobalSalt::random();
            tx.execute(
                "INSERT INTO lockbox_repository (id, name, global_salt) VALUES (?, ?, ?)",
                params![next_id, name, salt.as_bytes().to_vec()],
            )?;
            info!(repository = %name, repository_id = next_id, "Lockbox repository created");
            (next_id, salt)
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit()?;
    Ok((repository_id, global_salt))
}

impl EntryStore for DuckDbEntryStore {
    fn get_entries_for_hash(&self, key_hash: &str) -> StorageResult<Vec<Entry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT entry_guid, encrypted_key_bytes, key_iv, encrypted_value_bytes, value_iv, value_type \
             FROM lockbox_entry WHERE repository_id = ? AND key_hash = ?",
        )?;

        let rows = stmt.query_map(params![self.repository_id, key_hash], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, Vec<u8>>(4)?,
                row.get::<_, i32>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (entry_guid, key_bytes, key_iv, value_bytes, value_iv, value_type) = row?;
            entries.push(Entry {
                entry_guid,
                key_hash: key_hash.to_string(),
                encrypted_key: EncryptedBlock {
                    ciphertext: key_bytes,
                    iv: key_iv,
                },
                encrypted_value: EncryptedBlock {
                    ciphertext: value_bytes,
                    iv: value_iv,
                },
                value_type: ValueType::from_i32(value_type)?,
            });
        }
        Ok(entries)
    }

    fn set_entry(&self, entry: &Entry) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM lockbox_entry WHERE repository_id = ? AND entry_guid = ?",
            params![self.repository_id, entry.entry_guid],
        )?;
        tx.execute(
            r#"
            INSERT INTO lockbox_entry (
                repository_id, entry_guid, key_hash,
                encrypted_key_bytes, key_iv,
                encrypted_value_bytes, value_iv, value_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                self.repository_id,
                entry.entry_guid,
                entry.key_hash,
                entry.encrypted_key.ciphertext,
                entry.encrypted_key.iv,
                entry.encrypted_value.ciphertext,
                entry.encrypted_value.iv,
                entry.value_type.as_i32(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_entry_by_guid(&self, entry_guid: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM lockbox_entry WHERE repository_id = ? AND entry_guid = ?",
            params![self.repository_id, entry_guid],
        )?;
        debug!(entry_guid, affected, "Entry delete");
        Ok(())
    }

    fn get_encrypted_key_list(&self) -> StorageResult<Vec<EncryptedBlock>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT encrypted_key_bytes, key_iv FROM lockbox_entry WHERE repository_id = ?",
        )?;

        let keys = stmt
            .query_map(params![self.repository_id], |row| {
                Ok(EncryptedBlock {
                    ciphertext: row.get(0)?,
                    iv: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
