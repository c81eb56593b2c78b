//! Shared helpers for lockbox integration tests.
#![allow(dead_code)]

use lockbox_crypto::{generate_random_key, ChaChaCipher, GlobalSalt, KdfParams, Salt};
use lockbox_storage::{
    EncryptedBlock, Entry, EntryStore, InMemoryEntryStore, StorageError, StorageResult,
};
use lockbox_vault::{KeyValueLockbox, LockboxOptions, LockboxResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs a fmt subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn random_cipher() -> Arc<ChaChaCipher> {
    Arc::new(ChaChaCipher::new(generate_random_key()))
}

/// Password-derived cipher with cheap Argon2 parameters.
pub fn password_cipher(password: &str) -> Arc<ChaChaCipher> {
    let params = KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    Arc::new(ChaChaCipher::from_password(password, &Salt::from_bytes([42u8; 16]), &params).unwrap())
}

pub fn open(
    store: Arc<dyn EntryStore>,
    salt: GlobalSalt,
    cipher: Arc<ChaChaCipher>,
    create_new: bool,
) -> LockboxResult<KeyValueLockbox> {
    KeyValueLockbox::open(
        LockboxOptions::new()
            .global_salt(salt)
            .symmetric_key(cipher)
            .entry_store(store)
            .create_new(create_new),
    )
}

/// A freshly created lockbox over an in-memory store.
pub fn new_lockbox() -> (KeyValueLockbox, Arc<InMemoryEntryStore>) {
    init_tracing();
    let store = Arc::new(InMemoryEntryStore::new());
    let lockbox = open(store.clone(), store.global_salt(), random_cipher(), true).unwrap();
    (lockbox, store)
}

/// Puts every entry into one bucket, so every lookup has to resolve collisions.
pub struct CollidingStore {
    pub inner: InMemoryEntryStore,
}

pub const COLLIDING_BUCKET: &str = "everything";

impl CollidingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEntryStore::new(),
        }
    }
}

impl EntryStore for CollidingStore {
    fn get_entries_for_hash(&self, _key_hash: &str) -> StorageResult<Vec<Entry>> {
        self.inner.get_entries_for_hash(COLLIDING_BUCKET)
    }

    fn set_entry(&self, entry: &Entry) -> StorageResult<()> {
        let mut entry = entry.clone();
        entry.key_hash = COLLIDING_BUCKET.to_string();
        self.inner.set_entry(&entry)
    }

    fn delete_entry_by_guid(&self, entry_guid: &str) -> StorageResult<()> {
        self.inner.delete_entry_by_guid(entry_guid)
    }

    fn get_encrypted_key_list(&self) -> StorageResult<Vec<EncryptedBlock>> {
        self.inner.get_encrypted_key_list()
    }
}

/// Store whose operations can be switched to fail, as an unreachable backend would.
pub struct FlakyStore {
    pub inner: InMemoryEntryStore,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEntryStore::new(),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Lock("backend unavailable".into()));
        }
        Ok(())
    }
}

impl EntryStore for FlakyStore {
    fn get_entries_for_hash(&self, key_hash: &str) -> StorageResult<Vec<Entry>> {
        Self::check(&self.fail_reads)?;
        self.inner.get_entries_for_hash(key_hash)
    }

    fn set_entry(&self, entry: &Entry) -> StorageResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.set_entry(entry)
    }

    fn delete_entry_by_guid(&self, entry_guid: &str) -> StorageResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.delete_entry_by_guid(entry_guid)
    }

    fn get_encrypted_key_list(&self) -> StorageResult<Vec<EncryptedBlock>> {
        Self::check(&self.fail_reads)?;
        self.inner.get_encrypted_key_list()
    }
}

pub fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}
