// chain-crypto/src/lib.rs

//! Cryptographic identity core for the chain client
//!
//! This crate provides:
//! - secp256k1 key pair generation and recovery
//! - RFC 6979 deterministic ECDSA signing and verification
//! - Compressed-point account addresses
//! - The binary signature wire format (low-S canonical)
//! - Canonical transaction hashing

pub mod address;
pub mod curve;
pub mod hash;
pub mod keypair;
pub mod rfc6979;
pub mod signature;
pub mod signer;
pub mod transaction;

pub use address::{Address, ADDRESS_SIZE};
pub use curve::{CurveDomain, SCALAR_SIZE};
pub use hash::{Hash, HASH_SIZE};
pub use keypair::{KeyPair, PublicKey, SecretKey};
pub use signature::EcdsaSignature;
pub use signer::{sign_digest, verify_digest};
pub use transaction::{RawTransaction, TxType};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("Malformed signature encoding: {0}")]
    MalformedSignature(String),

    #[error("Signature integer is not below the curve order")]
    IntegerOverflow,

    #[error("Trailing bytes after signature: parsed {consumed} of {total}")]
    TrailingBytes { consumed: usize, total: usize },

    #[error("Random source failure: {0}")]
    RngFailure(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
