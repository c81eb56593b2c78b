//! The persisted entry model and the contract every backend implements.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an entry's value bytes are meant to be read back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Blob,
}

impl ValueType {
    /// Integer tag used in the `value_type` column.
    pub fn as_i32(self) -> i32 {
        match self {
            ValueType::String => 0,
            ValueType::Blob => 1,
        }
    }

    pub fn from_i32(tag: i32) -> StorageResult<Self> {
        match tag {
            0 => Ok(ValueType::String),
            1 => Ok(ValueType::Blob),
            other => Err(StorageError::InvalidValueType(other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Blob => f.write_str("blob"),
        }
    }
}

/// Ciphertext together with the IV it was encrypted under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlock {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
}

/// One stored key/value pair. Both halves are encrypted independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identifier, kept across updates of the same logical key.
    pub entry_guid: String,
    /// Salted digest of the logical key. Not unique: a bucket may hold
    /// entries for several keys.
    pub key_hash: String,
    pub encrypted_key: EncryptedBlock,
    pub encrypted_value: EncryptedBlock,
    pub value_type: ValueType,
}

/// Persistence backend for lockbox entries, scoped to one repository.
///
/// Implementations must make `set_entry` atomic (the previous version with
/// the same guid is either fully replaced or left untouched) and must make a
/// write visible to every later read through the same store.
pub trait EntryStore: Send + Sync {
    /// All entries whose `key_hash` equals `key_hash`, in no particular order.
    fn get_entries_for_hash(&self, key_hash: &str) -> StorageResult<Vec<Entry>>;

    /// Inserts the entry, or replaces the one with the same `entry_guid`.
    fn set_entry(&self, entry: &Entry) -> StorageResult<()>;

    /// Removes the entry with this guid. Unknown guids are not an error.
    fn delete_entry_by_guid(&self, entry_guid: &str) -> StorageResult<()>;

    /// The encrypted key of every stored entry.
    fn get_encrypted_key_list(&self) -> StorageResult<Vec<EncryptedBlock>>;
}
