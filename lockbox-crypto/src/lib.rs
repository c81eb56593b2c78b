//! Encryption layer for the lockbox secret store.
//!
//! Provides the primitives the lockbox engine is built on:
//! - ChaCha20-Poly1305 authenticated encryption with caller-visible IVs
//! - Argon2id key derivation from passwords
//! - Key material that is zeroized on drop
//!
//! # Architecture
//!
//! The engine never touches a concrete cipher. It holds an
//! `Arc<dyn SymmetricCipher>` and asks it for fresh IVs, encryption and
//! decryption. Each encryption uses its own IV, and the IV is stored next to
//! the ciphertext so the pair can be decrypted later with the same key.
//!
//! Every repository also owns a [`GlobalSalt`], a 32-byte random value that
//! is mixed into the lookup hash of every key so that key hashes cannot be
//! compared across repositories.

mod cipher;
mod error;
mod key;
mod salt;

pub use cipher::{ChaChaCipher, SymmetricCipher, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use salt::{GlobalSalt, GLOBAL_SALT_SIZE};
