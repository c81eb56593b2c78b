//! Repository-wide salt mixed into every key hash.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use std::fmt;

/// Size of a repository's global salt in bytes.
pub const GLOBAL_SALT_SIZE: usize = 32;

/// Random value bound to one repository.
///
/// Generated once when the repository is first created and reused for every
/// key-hash computation afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct GlobalSalt([u8; GLOBAL_SALT_SIZE]);

impl GlobalSalt {
    pub fn random() -> Self {
        let mut bytes = [0u8; GLOBAL_SALT_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; GLOBAL_SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Rebuilds a salt read back from storage.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != GLOBAL_SALT_SIZE {
            return Err(CryptoError::InvalidSaltLength {
                expected: GLOBAL_SALT_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; GLOBAL_SALT_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; GLOBAL_SALT_SIZE] {
        &self.0
    }
}

impl fmt::Debug for GlobalSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GlobalSalt(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_salts_differ() {
        assert_ne!(GlobalSalt::random(), GlobalSalt::random());
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = GlobalSalt::from_slice(&[1u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidSaltLength { expected: 32, actual: 16 }
        ));
    }

    #[test]
    fn from_slice_round_trips_bytes() {
        let salt = GlobalSalt::random();
        let restored = GlobalSalt::from_slice(salt.as_bytes()).unwrap();
        assert_eq!(salt, restored);
    }
}
