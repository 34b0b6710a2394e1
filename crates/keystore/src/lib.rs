// keystore/src/lib.rs

//! Encrypted private-key custody
//!
//! This crate provides:
//! - Password-based private-key encryption behind versioned cipher strategies
//! - A file-backed keystore, one record per identity
//! - An in-memory keystore with the same lifecycle semantics
//!
//! A store only ever holds encrypted bytes; unlocking, caching, and signing
//! with a loaded key belong to the wallet layer above.

pub mod cipher;
pub mod file;
pub mod memory;

pub use cipher::{CipherRegistry, KeyCipherStrategy, V1Cipher, ENVELOPE_VERSION_V1};
pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;

use chain_crypto::KeyPair;

/// Result type for keystore operations
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Errors that can occur during keystore operations
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("Identity already exists: {0}")]
    IdentityAlreadyExists(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Encryption failure")]
    EncryptionFailure,

    /// Authentication tag mismatch: a wrong password and a corrupted
    /// envelope are indistinguishable.
    #[error("Decryption failure")]
    DecryptionFailure,

    #[error("Unsupported keystore version: {0}")]
    UnsupportedVersion(String),

    #[error("Malformed keystore record: {0}")]
    MalformedRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] chain_crypto::CryptoError),
}

/// Identity-indexed custody of encrypted private keys.
///
/// Implementations serialize every operation behind one store-wide lock, so
/// concurrent callers observe each identity as either fully stored or fully
/// absent.
pub trait KeyStore {
    /// Encrypt and persist a key under `identity`.
    /// Fails with [`KeyStoreError::IdentityAlreadyExists`] rather than
    /// overwriting.
    fn save(&self, identity: &str, password: &str, key: &KeyPair) -> KeyStoreResult<()>;

    /// Decrypt the stored key for `identity`.
    fn load(&self, identity: &str, password: &str) -> KeyStoreResult<KeyPair>;

    /// Delete the record for `identity`. The password must decrypt the
    /// record first; a wrong password deletes nothing.
    fn remove(&self, identity: &str, password: &str) -> KeyStoreResult<()>;

    /// Re-encrypt the stored key under `new_password` and return the
    /// envelope without mutating the store.
    fn export(&self, identity: &str, password: &str, new_password: &str)
        -> KeyStoreResult<Vec<u8>>;

    /// All currently stored identities, in no particular order.
    fn list_identities(&self) -> KeyStoreResult<Vec<String>>;
}
