//! The lockbox engine: key hashing, per-entry encryption and bucket lookup.

use crate::error::{LockboxError, LockboxResult};
use crate::options::LockboxOptions;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lockbox_crypto::{GlobalSalt, SymmetricCipher};
use lockbox_storage::{EncryptedBlock, Entry, EntryStore, ValueType};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Key of the marker entry written when a repository is created.
pub const SENTINEL_KEY: &str = ".--lockbox";

/// Value the marker entry must decrypt to.
pub const SENTINEL_VALUE: &str = "lockbox";

/// Encrypted key-value store over a pluggable [`EntryStore`].
///
/// Keys and values are encrypted independently, each under its own IV.
/// Entries are found through a salted hash of the key; since that hash is
/// only a bucket, the stored keys in a bucket are decrypted and compared
/// until one matches exactly.
///
/// The lockbox can be shared across threads. Writes and deletes hold an
/// internal lock from the bucket lookup until the store call returns, so a
/// logical key never ends up with more than one stored entry.
pub struct KeyValueLockbox {
    global_salt: GlobalSalt,
    cipher: Arc<dyn SymmetricCipher>,
    entry_store: Arc<dyn EntryStore>,
    write_lock: Mutex<()>,
}

impl KeyValueLockbox {
    /// Creates a new repository or opens an existing one.
    ///
    /// With `create_new` the sentinel entry is written, failing with
    /// [`LockboxError::AlreadyInitialized`] if the repository already has one.
    /// Otherwise the sentinel is read back and checked; a wrong key, a missing
    /// sentinel or an unreachable store all fail with
    /// [`LockboxError::InvalidKeyOrUnreachable`].
    pub fn open(options: LockboxOptions) -> LockboxResult<Self> {
        let LockboxOptions {
            global_salt,
            symmetric_key,
            entry_store,
            create_new,
        } = options;

        let lockbox = Self {
            global_salt: global_salt.ok_or(LockboxError::NullArgument("global_salt"))?,
            cipher: symmetric_key.ok_or(LockboxError::NullArgument("symmetric_key"))?,
            entry_store: entry_store.ok_or(LockboxError::NullArgument("entry_store"))?,
            write_lock: Mutex::new(()),
        };

        if create_new {
            lockbox.initialize()?;
        } else {
            lockbox.verify()?;
        }
        Ok(lockbox)
    }

    fn initialize(&self) -> LockboxResult<()> {
        let _guard = self.lock_writes()?;
        // Any entry in the sentinel's bucket counts, even one this key can't decrypt.
        let key_hash = self.compute_key_hash(SENTINEL_KEY);
        if !self.entry_store.get_entries_for_hash(&key_hash)?.is_empty() {
            return Err(LockboxError::AlreadyInitialized);
        }

        self.store_entry(SENTINEL_KEY, SENTINEL_VALUE.as_bytes(), ValueType::String)?;
        info!("Lockbox initialized");
        Ok(())
    }

    fn verify(&self) -> LockboxResult<()> {
        match self.get_entry_value_string(SENTINEL_KEY) {
            Ok(value) if value == SENTINEL_VALUE => {
                info!("Lockbox opened");
                Ok(())
            }
            Ok(_) => {
                warn!("Lockbox sentinel value mismatch");
                Err(LockboxError::InvalidKeyOrUnreachable)
            }
            Err(e) => {
                warn!(error = %e, "Lockbox sentinel check failed");
                Err(LockboxError::InvalidKeyOrUnreachable)
            }
        }
    }

    /// Lookup bucket for `key`: base64 of SHA-256 over the key's UTF-8 bytes
    /// followed by the global salt.
    pub fn compute_key_hash(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(self.global_salt.as_bytes());
        BASE64.encode(hasher.finalize())
    }

    /// Stores a string value, replacing any previous value for `key`.
    pub fn set_entry(&self, key: &str, value: &str) -> LockboxResult<()> {
        ensure_not_reserved(key)?;
        self.write_entry(key, value.as_bytes(), ValueType::String)
    }

    /// Stores raw bytes, replacing any previous value for `key`.
    pub fn set_entry_blob(&self, key: &str, data: &[u8]) -> LockboxResult<()> {
        ensure_not_reserved(key)?;
        self.write_entry(key, data, ValueType::Blob)
    }

    pub fn get_entry_value_string(&self, key: &str) -> LockboxResult<String> {
        let bytes = self.read_entry(key, ValueType::String)?;
        String::from_utf8(bytes).map_err(|_| LockboxError::Corrupt("string value is not valid UTF-8"))
    }

    pub fn get_entry_value_blob(&self, key: &str) -> LockboxResult<Vec<u8>> {
        self.read_entry(key, ValueType::Blob)
    }

    pub fn delete_entry(&self, key: &str) -> LockboxResult<()> {
        ensure_not_reserved(key)?;
        let _guard = self.lock_writes()?;
        let entry = self.require_entry(key)?;
        self.entry_store.delete_entry_by_guid(&entry.entry_guid)?;
        debug!(entry_guid = %entry.entry_guid, "Entry deleted");
        Ok(())
    }

    /// Whether an entry exists for `key`. Values are not decrypted.
    pub fn contains_key(&self, key: &str) -> LockboxResult<bool> {
        let key_hash = self.compute_key_hash(key);
        Ok(self.find_entry(key, &key_hash)?.is_some())
    }

    /// Decrypts every stored key. Order is unspecified; the sentinel is left out.
    pub fn get_key_list(&self) -> LockboxResult<Vec<String>> {
        let encrypted_keys = self.entry_store.get_encrypted_key_list()?;

        let mut keys = Vec::with_capacity(encrypted_keys.len());
        for block in &encrypted_keys {
            let bytes = self.decrypt_block(block)?;
            let key = String::from_utf8(bytes)
                .map_err(|_| LockboxError::Corrupt("stored key is not valid UTF-8"))?;
            if key != SENTINEL_KEY {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn write_entry(&self, key: &str, data: &[u8], value_type: ValueType) -> LockboxResult<()> {
        let _guard = self.lock_writes()?;
        self.store_entry(key, data, value_type)
    }

    /// Caller must hold the write lock.
    fn store_entry(&self, key: &str, data: &[u8], value_type: ValueType) -> LockboxResult<()> {
        let key_hash = self.compute_key_hash(key);

        let existing = self.find_entry(key, &key_hash)?;
        let replaced = existing.is_some();
        let entry_guid = match existing {
            Some(entry) => entry.entry_guid,
            None => Uuid::new_v4().to_string(),
        };

        let entry = Entry {
            entry_guid,
            key_hash,
            encrypted_key: self.encrypt_block(key.as_bytes())?,
            encrypted_value: self.encrypt_block(data)?,
            value_type,
        };
        self.entry_store.set_entry(&entry)?;

        debug!(entry_guid = %entry.entry_guid, %value_type, replaced, "Entry stored");
        Ok(())
    }

    fn read_entry(&self, key: &str, expected: ValueType) -> LockboxResult<Vec<u8>> {
        let entry = self.require_entry(key)?;
        if entry.value_type != expected {
            return Err(LockboxError::ValueTypeMismatch {
                key: key.to_string(),
                expected,
                actual: entry.value_type,
            });
        }
        self.decrypt_block(&entry.encrypted_value)
    }

    fn require_entry(&self, key: &str) -> LockboxResult<Entry> {
        let key_hash = self.compute_key_hash(key);
        self.find_entry(key, &key_hash)?
            .ok_or_else(|| LockboxError::EntryNotFound(key.to_string()))
    }

    /// Scans the bucket, decrypting each stored key until one equals `key`.
    ///
    /// A bucket entry this cipher cannot decrypt fails the whole lookup with
    /// [`LockboxError::Crypto`], even if another entry would have matched.
    fn find_entry(&self, key: &str, key_hash: &str) -> LockboxResult<Option<Entry>> {
        let bucket = self.entry_store.get_entries_for_hash(key_hash)?;
        if bucket.len() > 1 {
            debug!(candidates = bucket.len(), "Key hash bucket collision");
        }

        for entry in bucket {
            if self.decrypt_block(&entry.encrypted_key)? == key.as_bytes() {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn lock_writes(&self) -> LockboxResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| LockboxError::Lock(e.to_string()))
    }

    fn encrypt_block(&self, plaintext: &[u8]) -> LockboxResult<EncryptedBlock> {
        let iv = self.cipher.generate_iv();
        let ciphertext = self.cipher.encrypt(plaintext, &iv)?;
        Ok(EncryptedBlock { ciphertext, iv })
    }

    fn decrypt_block(&self, block: &EncryptedBlock) -> LockboxResult<Vec<u8>> {
        Ok(self.cipher.decrypt(&block.ciphertext, &block.iv)?)
    }
}

fn ensure_not_reserved(key: &str) -> LockboxResult<()> {
    if key == SENTINEL_KEY {
        return Err(LockboxError::ReservedKey(key.to_string()));
    }
    Ok(())
}

impl fmt::Debug for KeyValueLockbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueLockbox").finish_non_exhaustive()
    }
}
