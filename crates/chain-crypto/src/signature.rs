// chain-crypto/src/signature.rs

//! ECDSA signature type and its binary wire format.
//!
//! Serialized layout, shared with every signature consumer on the network:
//!
//! ```text
//! [0x30][len of remainder][0x02][len r][r bytes][0x02][len s][s bytes]
//! ```
//!
//! Integers are minimal-length big-endian two's-complement (a leading zero
//! byte appears when the high bit is set). Serialization canonicalizes to
//! low-S first, so each signature has exactly one valid encoding.

use crate::curve::{biguint_to_scalar, scalar_to_biguint, CurveDomain};
use crate::{CryptoError, CryptoResult};
use k256::Scalar;
use num_bigint::{BigInt, BigUint, Sign};
use std::fmt;

/// Leading byte of every serialized signature
pub const HEADER_MAGIC: u8 = 0x30;

/// Marker byte preceding each encoded integer
pub const INT_MARKER: u8 = 0x02;

/// Smallest possible serialization: header plus two one-byte integers
pub const MIN_SERIALIZED_LEN: usize = 8;

/// A raw ECDSA signature `(r, s)`, both scalars below the curve order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    r: Scalar,
    s: Scalar,
}

impl EcdsaSignature {
    pub(crate) fn new(r: Scalar, s: Scalar) -> Self {
        Self { r, s }
    }

    pub fn r(&self) -> Scalar {
        self.r
    }

    pub fn s(&self) -> Scalar {
        self.s
    }

    /// Serialize into the fixed wire format, canonicalizing to low-S.
    pub fn serialize(&self, domain: &CurveDomain) -> Vec<u8> {
        let r = scalar_to_biguint(&self.r);
        let mut s = scalar_to_biguint(&self.s);
        if &s > domain.half_order() {
            s = domain.order() - &s;
        }

        let r_bytes = signed_minimal(&r);
        let s_bytes = signed_minimal(&s);

        let mut out = Vec::with_capacity(6 + r_bytes.len() + s_bytes.len());
        out.push(HEADER_MAGIC);
        out.push((4 + r_bytes.len() + s_bytes.len()) as u8);
        out.push(INT_MARKER);
        out.push(r_bytes.len() as u8);
        out.extend_from_slice(&r_bytes);
        out.push(INT_MARKER);
        out.push(s_bytes.len() as u8);
        out.extend_from_slice(&s_bytes);
        out
    }

    /// Parse the wire format back into `(r, s)` with strict validation.
    ///
    /// Rejects bad magic, implausible lengths, bad integer markers, values
    /// not below the curve order, and leftover bytes. Never coerces.
    pub fn parse(bytes: &[u8], domain: &CurveDomain) -> CryptoResult<Self> {
        if bytes.len() < MIN_SERIALIZED_LEN {
            return Err(CryptoError::MalformedSignature(format!(
                "serialized length {} is below the minimum {MIN_SERIALIZED_LEN}",
                bytes.len()
            )));
        }
        if bytes[0] != HEADER_MAGIC {
            return Err(CryptoError::MalformedSignature(format!(
                "invalid magic: expected {HEADER_MAGIC:#04x}, got {:#04x}",
                bytes[0]
            )));
        }
        let declared = bytes[1] as usize;
        if declared < MIN_SERIALIZED_LEN - 2 || bytes.len() - 2 < declared {
            return Err(CryptoError::MalformedSignature(format!(
                "implausible declared length {declared} for {} input bytes",
                bytes.len()
            )));
        }

        let mut index = 2;
        let (r, next) = parse_integer(bytes, index, domain)?;
        index = next;
        let (s, next) = parse_integer(bytes, index, domain)?;
        index = next;

        if index < bytes.len() {
            return Err(CryptoError::TrailingBytes {
                consumed: index,
                total: bytes.len(),
            });
        }

        Ok(Self { r, s })
    }
}

impl fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EcdsaSignature(r={}..., s=...)",
            hex::encode(&self.r.to_bytes()[..4])
        )
    }
}

/// Minimal big-endian two's-complement encoding of a non-negative integer.
fn signed_minimal(value: &BigUint) -> Vec<u8> {
    BigInt::from(value.clone()).to_signed_bytes_be()
}

fn parse_integer(source: &[u8], start: usize, domain: &CurveDomain) -> CryptoResult<(Scalar, usize)> {
    let mut index = start;

    let marker = *source
        .get(index)
        .ok_or_else(|| CryptoError::MalformedSignature("truncated before integer marker".into()))?;
    if marker != INT_MARKER {
        return Err(CryptoError::MalformedSignature(format!(
            "invalid integer marker: expected {INT_MARKER:#04x}, got {marker:#04x}"
        )));
    }
    index += 1;

    let length = *source
        .get(index)
        .ok_or_else(|| CryptoError::MalformedSignature("truncated before integer length".into()))?
        as usize;
    index += 1;
    if length == 0 {
        return Err(CryptoError::MalformedSignature("empty integer".into()));
    }

    let raw = source
        .get(index..index + length)
        .ok_or_else(|| CryptoError::MalformedSignature("declared integer length exceeds input".into()))?;
    let value = BigInt::from_signed_bytes_be(raw);
    if value.sign() == Sign::Minus {
        return Err(CryptoError::MalformedSignature("negative integer".into()));
    }
    let magnitude = value.magnitude();
    if magnitude >= domain.order() {
        return Err(CryptoError::IntegerOverflow);
    }
    let scalar = biguint_to_scalar(magnitude).ok_or(CryptoError::IntegerOverflow)?;
    index += length;

    Ok((scalar, index))
}
