//! In-memory entry store, used by tests and short-lived lockboxes.

use crate::entry::{EncryptedBlock, Entry, EntryStore};
use crate::error::{StorageError, StorageResult};
use lockbox_crypto::GlobalSalt;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Maps {
    by_hash: HashMap<String, Vec<Entry>>,
    by_guid: HashMap<String, Entry>,
}

/// Entry store backed by two hash maps.
///
/// A single mutex guards both maps, so every read and write is serialized
/// against every other. Callers always receive copies of stored entries.
pub struct InMemoryEntryStore {
    maps: Mutex<Maps>,
    global_salt: GlobalSalt,
}

impl InMemoryEntryStore {
    /// Creates an empty store with a freshly generated global salt.
    pub fn new() -> Self {
        Self::with_global_salt(GlobalSalt::random())
    }

    pub fn with_global_salt(global_salt: GlobalSalt) -> Self {
        Self {
            maps: Mutex::new(Maps::default()),
            global_salt,
        }
    }

    pub fn global_salt(&self) -> GlobalSalt {
        self.global_salt.clone()
    }

    /// Number of stored entries.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.lock()?.by_guid.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Maps>> {
        self.maps.lock().map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore for InMemoryEntryStore {
    fn get_entries_for_hash(&self, key_hash: &str) -> StorageResult<Vec<Entry>> {
        let maps = self.lock()?;
        Ok(maps.by_hash.get(key_hash).cloned().unwrap_or_default())
    }

    fn set_entry(&self, entry: &Entry) -> StorageResult<()> {
        let mut guard = self.lock()?;
        let maps = &mut *guard;

        if let Some(previous) = maps.by_guid.insert(entry.entry_guid.clone(), entry.clone()) {
            if previous.key_hash != entry.key_hash {
                remove_from_bucket(&mut maps.by_hash, &previous.key_hash, &previous.entry_guid);
            }
        }

        let bucket = maps.by_hash.entry(entry.key_hash.clone()).or_default();
        match bucket.iter().position(|e| e.entry_guid == entry.entry_guid) {
            Some(slot) => bucket[slot] = entry.clone(),
            None => bucket.push(entry.clone()),
        }
        Ok(())
    }

    fn delete_entry_by_guid(&self, entry_guid: &str) -> StorageResult<()> {
        let mut guard = self.lock()?;
        let maps = &mut *guard;

        if let Some(existing) = maps.by_guid.remove(entry_guid) {
            remove_from_bucket(&mut maps.by_hash, &existing.key_hash, entry_guid);
        }
        Ok(())
    }

    fn get_encrypted_key_list(&self) -> StorageResult<Vec<EncryptedBlock>> {
        let maps = self.lock()?;
        Ok(maps
            .by_guid
            .values()
            .map(|e| e.encrypted_key.clone())
            .collect())
    }
}

fn remove_from_bucket(by_hash: &mut HashMap<String, Vec<Entry>>, key_hash: &str, entry_guid: &str) {
    if let Some(bucket) = by_hash.get_mut(key_hash) {
        bucket.retain(|e| e.entry_guid != entry_guid);
        if bucket.is_empty() {
            by_hash.remove(key_hash);
        }
    }
}
