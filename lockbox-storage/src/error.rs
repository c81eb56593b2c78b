//! Storage error types.

use lockbox_crypto::CryptoError;
use thiserror::Error;

/// Result type for entry store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur inside an entry store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("store lock poisoned: {0}")]
    Lock(String),

    #[error("invalid stored salt: {0}")]
    Crypto(#[from] CryptoError),

    #[error("unknown value type tag: {0}")]
    InvalidValueType(i32),

    #[error("invalid store config: {0}")]
    Config(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
