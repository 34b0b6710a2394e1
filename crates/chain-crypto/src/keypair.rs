// chain-crypto/src/keypair.rs

use crate::curve::SCALAR_SIZE;
use crate::signature::EcdsaSignature;
use crate::{CryptoError, CryptoResult};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use std::fmt;

/// Secret signing key: the private scalar `d`, `1 <= d < n`.
pub struct SecretKey {
    scalar: Scalar,
}

impl SecretKey {
    pub(crate) fn from_scalar(scalar: Scalar) -> Self {
        Self { scalar }
    }

    /// Reconstruct from a 32-byte big-endian scalar encoding.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "expected {SCALAR_SIZE}-byte scalar, got {}",
                bytes.len()
            )));
        }
        let repr = FieldBytes::clone_from_slice(bytes);
        let scalar: Option<Scalar> = Scalar::from_repr(repr).into();
        let scalar = scalar
            .ok_or_else(|| CryptoError::InvalidKeyMaterial("scalar is not below the curve order".into()))?;
        if bool::from(scalar.is_zero()) {
            return Err(CryptoError::InvalidKeyMaterial("scalar is zero".into()));
        }
        Ok(Self { scalar })
    }

    /// Big-endian scalar encoding, the form the keystore encrypts.
    pub fn to_bytes(&self) -> [u8; SCALAR_SIZE] {
        self.scalar.to_bytes().into()
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.scalar
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        // Zero out the key material on drop for security
        self.scalar = Scalar::ZERO;
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// Public verification key: the curve point `Q = d*G`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    pub(crate) fn from_affine(point: AffinePoint) -> Self {
        Self { point }
    }

    /// Decode a SEC1 point encoding (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| CryptoError::InvalidKeyMaterial("not a point on the curve".into()))?;
        Ok(Self { point: *key.as_affine() })
    }

    /// Compressed SEC1 encoding, 33 bytes.
    pub fn to_sec1_bytes(&self) -> [u8; 33] {
        let encoded = self.point.to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(encoded.as_bytes());
        bytes
    }

    /// Derive the account address of this key
    pub fn to_address(&self) -> crate::Address {
        crate::Address::from_public_key(self)
    }

    /// Verify a signature over a 32-byte digest
    pub fn verify(&self, digest: &[u8], signature: &EcdsaSignature) -> CryptoResult<bool> {
        crate::signer::verify_digest(self, digest, signature)
    }

    pub(crate) fn point(&self) -> &AffinePoint {
        &self.point
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", hex::encode(&self.to_sec1_bytes()[..8]))
    }
}

/// Key pair containing both public and secret keys
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair from the operating system source.
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate from a caller-supplied source, drawing `d` uniformly in
    /// `[1, n-1]` by rejection sampling.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> CryptoResult<Self> {
        loop {
            let mut bytes = [0u8; SCALAR_SIZE];
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| CryptoError::RngFailure(e.to_string()))?;
            let candidate: Option<Scalar> = Scalar::from_repr(FieldBytes::from(bytes)).into();
            match candidate {
                Some(scalar) if !bool::from(scalar.is_zero()) => {
                    return Ok(Self::from_secret(SecretKey::from_scalar(scalar)));
                }
                _ => continue,
            }
        }
    }

    /// Recover a keypair from a stored 32-byte scalar encoding.
    pub fn from_scalar_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        Ok(Self::from_secret(SecretKey::from_bytes(bytes)?))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public =
            PublicKey::from_affine((ProjectivePoint::GENERATOR * secret.scalar()).to_affine());
        Self { secret, public }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Derive the account address of the public key
    pub fn address(&self) -> crate::Address {
        self.public.to_address()
    }

    /// Sign a 32-byte digest with an RFC 6979 deterministic nonce
    pub fn sign(&self, digest: &[u8]) -> CryptoResult<EcdsaSignature> {
        crate::signer::sign_digest(&self.secret, digest)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp1 = KeyPair::generate().unwrap();
        let kp2 = KeyPair::generate().unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_scalar_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let encoded = keypair.secret_key().to_bytes();
        let recovered = KeyPair::from_scalar_bytes(&encoded).unwrap();
        assert_eq!(recovered.public_key(), keypair.public_key());
    }

    #[test]
    fn test_from_scalar_rejects_bad_material() {
        assert!(KeyPair::from_scalar_bytes(&[0u8; 32]).is_err());
        assert!(KeyPair::from_scalar_bytes(&[0xffu8; 32]).is_err());
        assert!(KeyPair::from_scalar_bytes(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_public_key_sec1_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let encoded = keypair.public_key().to_sec1_bytes();
        let decoded = PublicKey::from_sec1_bytes(&encoded).unwrap();
        assert_eq!(&decoded, keypair.public_key());
    }

    #[test]
    fn test_public_key_rejects_invalid_encoding() {
        // bad SEC1 tag
        assert!(PublicKey::from_sec1_bytes(&[0u8; 33]).is_err());
        // wrong length
        assert!(PublicKey::from_sec1_bytes(&[0x02u8; 10]).is_err());
    }
}
