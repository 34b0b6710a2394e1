// chain-crypto/src/address.rs

use crate::keypair::PublicKey;
use crate::{CryptoError, CryptoResult};
use k256::elliptic_curve::point::{AffineCoordinates, DecompressPoint};
use k256::{AffinePoint, FieldBytes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Address size: parity prefix plus the 32-byte X coordinate
pub const ADDRESS_SIZE: usize = 33;

/// Version byte prepended for the base58check textual form
pub const ADDRESS_VERSION: u8 = 0x42;

/// Account address: a compressed secp256k1 point.
///
/// Byte 0 is `0x02` for an even Y coordinate, `0x03` for odd; the remaining
/// 32 bytes are the X coordinate big-endian, left-padded with zeros.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Derive the address of a public key. Pure and deterministic.
    pub fn from_public_key(public: &PublicKey) -> Self {
        let point = public.point();
        let mut raw = [0u8; ADDRESS_SIZE];
        raw[0] = if bool::from(point.y_is_odd()) { 0x03 } else { 0x02 };
        raw[1..].copy_from_slice(point.x().as_slice());
        Self(raw)
    }

    /// Validate raw address bytes (length and parity prefix only; curve
    /// membership is checked by [`Address::recover_public_key`]).
    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {ADDRESS_SIZE} bytes, got {}",
                slice.len()
            )));
        }
        if slice[0] != 0x02 && slice[0] != 0x03 {
            return Err(CryptoError::InvalidAddress(format!(
                "invalid parity prefix {:#04x}",
                slice[0]
            )));
        }
        let mut raw = [0u8; ADDRESS_SIZE];
        raw.copy_from_slice(slice);
        Ok(Self(raw))
    }

    /// Decompress the address back into the public key it was derived from.
    pub fn recover_public_key(&self) -> CryptoResult<PublicKey> {
        let x = FieldBytes::clone_from_slice(&self.0[1..]);
        let y_is_odd = (self.0[0] & 0x01).into();
        let point: Option<AffinePoint> = AffinePoint::decompress(&x, y_is_odd).into();
        let point = point
            .ok_or_else(|| CryptoError::InvalidAddress("not a point on the curve".into()))?;
        Ok(PublicKey::from_affine(point))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    /// Base58check textual form with the network version byte.
    pub fn to_encoded(&self) -> String {
        bs58::encode(&self.0)
            .with_check_version(ADDRESS_VERSION)
            .into_string()
    }

    /// Parse the base58check textual form back into the 33 raw bytes.
    pub fn from_encoded(encoded: &str) -> CryptoResult<Self> {
        let decoded = bs58::decode(encoded)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        // the version byte is retained by the decoder
        Self::from_slice(&decoded[1..])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_encoded())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_encoded())
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_encoded(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_encoded())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_encoded(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn test_derivation_shape() {
        let keypair = KeyPair::generate().unwrap();
        let address = keypair.address();
        assert_eq!(address.as_bytes().len(), ADDRESS_SIZE);
        assert!(address.as_bytes()[0] == 0x02 || address.as_bytes()[0] == 0x03);
        // compressed SEC1 encoding and the address coincide
        assert_eq!(address.as_bytes(), keypair.public_key().to_sec1_bytes());
    }

    #[test]
    fn test_recover_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let address = keypair.address();
        let recovered = address.recover_public_key().unwrap();
        assert_eq!(&recovered, keypair.public_key());
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Address::from_slice(&[0x02; 32]).is_err());
        assert!(Address::from_slice(&[0x02; 34]).is_err());
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let keypair = KeyPair::generate().unwrap();
        let mut raw = keypair.address().to_bytes();
        raw[0] = 0x04;
        assert!(matches!(
            Address::from_slice(&raw),
            Err(CryptoError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_rejects_x_not_on_curve() {
        // x = 5: x^3 + 7 is a non-residue, so no point exists for either parity
        let mut raw = [0u8; ADDRESS_SIZE];
        raw[32] = 0x05;
        for prefix in [0x02, 0x03] {
            raw[0] = prefix;
            let address = Address::from_slice(&raw).unwrap();
            assert!(matches!(
                address.recover_public_key(),
                Err(CryptoError::InvalidAddress(_))
            ));
        }
    }

    #[test]
    fn test_encoded_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let address = keypair.address();
        let encoded = address.to_encoded();
        let decoded = Address::from_encoded(&encoded).unwrap();
        assert_eq!(decoded, address);
    }

    #[test]
    fn test_encoded_rejects_corruption() {
        let keypair = KeyPair::generate().unwrap();
        let mut encoded = keypair.address().to_encoded();
        encoded.pop();
        encoded.push('1');
        assert!(Address::from_encoded(&encoded).is_err());
    }
}
