// chain-crypto/src/transaction.rs

use crate::address::Address;
use crate::hash::Hash;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Protocol transaction categories and their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    Unrecognized,
    Normal,
    Governance,
}

impl TxType {
    /// Integer code written into the transaction hash
    pub fn code(&self) -> i32 {
        match self {
            TxType::Unrecognized => -1,
            TxType::Normal => 0,
            TxType::Governance => 1,
        }
    }
}

/// Raw transaction fields, as supplied by the transaction builder.
///
/// The field set, their order, and their byte widths in
/// [`RawTransaction::hash_unsigned`] are a wire contract with the remote
/// network: a transaction hashed any other way is a different transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub nonce: u64,
    pub sender: Address,
    pub recipient: Address,
    pub amount: BigUint,
    pub payload: Vec<u8>,
    pub fee_limit: u64,
    pub fee_price: BigUint,
    pub tx_type: TxType,
    pub chain_id_hash: Hash,
}

impl RawTransaction {
    /// Digest the signature commits to
    pub fn hash_unsigned(&self) -> Hash {
        Hash::digest(&self.serialize_fields())
    }

    /// Final transaction identifier: the field serialization with the
    /// serialized signature appended
    pub fn hash_signed(&self, serialized_signature: &[u8]) -> Hash {
        let mut buf = self.serialize_fields();
        buf.extend_from_slice(serialized_signature);
        Hash::digest(&buf)
    }

    // WARNING: follow the stream order and widths expected by the server
    fn serialize_fields(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.payload.len());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.sender.as_bytes()[1..]);
        buf.extend_from_slice(&self.recipient.as_bytes()[1..]);
        buf.extend_from_slice(&unsigned_minimal(&self.amount));
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.fee_limit.to_le_bytes());
        buf.extend_from_slice(&unsigned_minimal(&self.fee_price));
        buf.extend_from_slice(&self.tx_type.code().to_le_bytes());
        buf.extend_from_slice(self.chain_id_hash.as_bytes());
        buf
    }
}

/// Minimal unsigned big-endian encoding; zero is a single `0x00` byte
fn unsigned_minimal(value: &BigUint) -> Vec<u8> {
    value.to_bytes_be()
}
