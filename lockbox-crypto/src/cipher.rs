//! Symmetric cipher contract and its ChaCha20-Poly1305 implementation.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, DerivedKey, KdfParams, Salt};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use std::fmt;

/// Size of a ChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag appended to each ciphertext.
pub const TAG_SIZE: usize = 16;

/// Encrypts and decrypts byte sequences under a key the implementation owns.
///
/// IVs are explicit: callers ask for a fresh one per encryption and store it
/// alongside the ciphertext. Decrypting with the wrong key must either fail
/// or return bytes the caller can reject.
pub trait SymmetricCipher: Send + Sync {
    /// A fresh, unpredictable IV of the right length for this cipher.
    fn generate_iv(&self) -> Vec<u8>;

    fn encrypt(&self, plaintext: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// ChaCha20-Poly1305 keyed by a 256-bit [`DerivedKey`].
#[derive(Clone)]
pub struct ChaChaCipher {
    key: DerivedKey,
}

impl ChaChaCipher {
    pub fn new(key: DerivedKey) -> Self {
        Self { key }
    }

    /// Derives the key from a password with Argon2id.
    pub fn from_password(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<Self> {
        Ok(Self::new(derive_key(password, salt, params)?))
    }

    fn aead(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.key.as_bytes()))
    }
}

fn check_nonce(iv: &[u8]) -> CryptoResult<&Nonce> {
    if iv.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonceLength {
            expected: NONCE_SIZE,
            actual: iv.len(),
        });
    }
    Ok(Nonce::from_slice(iv))
}

impl SymmetricCipher for ChaChaCipher {
    fn generate_iv(&self) -> Vec<u8> {
        let mut iv = vec![0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut iv);
        iv
    }

    fn encrypt(&self, plaintext: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
        let nonce = check_nonce(iv)?;
        self.aead()
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
        let nonce = check_nonce(iv)?;
        self.aead()
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))
    }
}

impl fmt::Debug for ChaChaCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaChaCipher").finish_non_exhaustive()
    }
}
