//! Lockbox error types.

use lockbox_crypto::CryptoError;
use lockbox_storage::{StorageError, ValueType};
use thiserror::Error;

pub type LockboxResult<T> = Result<T, LockboxError>;

/// Errors returned by lockbox operations.
///
/// Messages may name the logical key the caller passed in, but never carry
/// stored values, ciphertext or key material.
#[derive(Debug, Error)]
pub enum LockboxError {
    #[error("required argument missing: {0}")]
    NullArgument(&'static str),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("entry {key} holds a {actual} value, not a {expected}")]
    ValueTypeMismatch {
        key: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("lockbox already initialized")]
    AlreadyInitialized,

    #[error("invalid key or unable to connect to lockbox")]
    InvalidKeyOrUnreachable,

    #[error("key is reserved for lockbox validation: {0}")]
    ReservedKey(String),

    #[error("lockbox lock poisoned: {0}")]
    Lock(String),

    #[error("corrupt entry: {0}")]
    Corrupt(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
