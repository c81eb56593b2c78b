//! Encrypted key-value lockbox.
//!
//! Callers set and read string or binary values under string keys. Nothing
//! reaches the [`EntryStore`](lockbox_storage::EntryStore) in plaintext:
//!
//! - keys and values are encrypted separately, each with a fresh IV
//! - entries are indexed by SHA-256 over the key and the repository's
//!   global salt, never by the key itself
//! - a sentinel entry written at creation lets `open` tell a wrong key
//!   apart from a working one before any real data is touched
//!
//! # Example
//!
//! ```no_run
//! use lockbox_crypto::{generate_random_key, ChaChaCipher};
//! use lockbox_storage::DuckDbEntryStore;
//! use lockbox_vault::{KeyValueLockbox, LockboxOptions};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DuckDbEntryStore::open(Path::new("secrets.duckdb"), "default")?;
//! let lockbox = KeyValueLockbox::open(
//!     LockboxOptions::new()
//!         .global_salt(store.global_salt())
//!         .symmetric_key(Arc::new(ChaChaCipher::new(generate_random_key())))
//!         .entry_store(Arc::new(store))
//!         .create_new(true),
//! )?;
//!
//! lockbox.set_entry("Hello", "World")?;
//! assert_eq!(lockbox.get_entry_value_string("Hello")?, "World");
//! # Ok(())
//! # }
//! ```

mod error;
mod lockbox;
mod options;

pub use error::{LockboxError, LockboxResult};
pub use lockbox::{KeyValueLockbox, SENTINEL_KEY, SENTINEL_VALUE};
pub use options::LockboxOptions;
