//! Inputs for opening a lockbox.

use lockbox_crypto::{GlobalSalt, SymmetricCipher};
use lockbox_storage::EntryStore;
use std::fmt;
use std::sync::Arc;

/// Everything [`KeyValueLockbox::open`](crate::KeyValueLockbox::open) needs.
///
/// Salt, key and store are required; `open` reports whichever is missing as
/// [`LockboxError::NullArgument`](crate::LockboxError::NullArgument).
#[derive(Clone, Default)]
pub struct LockboxOptions {
    /// Repository salt, normally read from the entry store's repository.
    pub global_salt: Option<GlobalSalt>,
    pub symmetric_key: Option<Arc<dyn SymmetricCipher>>,
    pub entry_store: Option<Arc<dyn EntryStore>>,
    /// `true` to initialize a new repository, `false` to open an existing one.
    pub create_new: bool,
}

impl LockboxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_salt(mut self, global_salt: GlobalSalt) -> Self {
        self.global_salt = Some(global_salt);
        self
    }

    pub fn symmetric_key(mut self, symmetric_key: Arc<dyn SymmetricCipher>) -> Self {
        self.symmetric_key = Some(symmetric_key);
        self
    }

    pub fn entry_store(mut self, entry_store: Arc<dyn EntryStore>) -> Self {
        self.entry_store = Some(entry_store);
        self
    }

    pub fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }
}

impl fmt::Debug for LockboxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockboxOptions")
            .field("global_salt", &self.global_salt.is_some())
            .field("symmetric_key", &self.symmetric_key.is_some())
            .field("entry_store", &self.entry_store.is_some())
            .field("create_new", &self.create_new)
            .finish()
    }
}
