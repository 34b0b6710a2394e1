// chain-crypto/src/signer.rs

//! Deterministic ECDSA signing and verification over secp256k1.
//!
//! The nonce comes from RFC 6979, so signing is reproducible and never
//! touches a random source. The second signature scalar is emitted as
//! `n - k^-1(e + r*d)` rather than the textbook value: the network's
//! verifier expects this form, and it is part of the wire contract. Do not
//! "correct" it.

use crate::hash::HASH_SIZE;
use crate::keypair::{PublicKey, SecretKey};
use crate::rfc6979::NonceSequence;
use crate::signature::EcdsaSignature;
use crate::{CryptoError, CryptoResult};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::{Field, Group};
use k256::{FieldBytes, ProjectivePoint, Scalar, U256};

fn digest_array(digest: &[u8]) -> CryptoResult<[u8; HASH_SIZE]> {
    digest.try_into().map_err(|_| CryptoError::InvalidDigestLength {
        expected: HASH_SIZE,
        actual: digest.len(),
    })
}

/// Scalar value of a 32-byte digest, reduced mod `n`.
fn digest_scalar(digest: &[u8; HASH_SIZE]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*digest))
}

/// Sign a 32-byte digest.
///
/// Candidates with a zero `r` or a degenerate `s` are discarded and the next
/// RFC 6979 nonce drawn; the loop is invisible to the caller and terminates
/// after one iteration for any realistic input.
pub fn sign_digest(secret: &SecretKey, digest: &[u8]) -> CryptoResult<EcdsaSignature> {
    let digest = digest_array(digest)?;
    let d = *secret.scalar();
    let e = digest_scalar(&digest);
    let mut nonces = NonceSequence::new(&d, &digest);

    loop {
        let k = nonces.next();

        let r_point = (ProjectivePoint::GENERATOR * k).to_affine();
        let r = <Scalar as Reduce<U256>>::reduce_bytes(&r_point.x());
        if bool::from(r.is_zero()) {
            continue;
        }

        let Some(k_inv) = Option::<Scalar>::from(k.invert()) else {
            continue;
        };
        let s = k_inv * (e + r * d);
        if bool::from(s.is_zero()) {
            continue;
        }

        // n - s: the protocol's flipped-s convention
        return Ok(EcdsaSignature::new(r, -s));
    }
}

/// Verify a signature over a 32-byte digest.
///
/// Returns `false` for any signature the curve equation rejects; errors only
/// on a digest that is not 32 bytes.
pub fn verify_digest(
    public: &PublicKey,
    digest: &[u8],
    signature: &EcdsaSignature,
) -> CryptoResult<bool> {
    let digest = digest_array(digest)?;
    let r = signature.r();
    let s = signature.s();
    if bool::from(r.is_zero()) || bool::from(s.is_zero()) {
        return Ok(false);
    }

    let e = digest_scalar(&digest);
    let Some(w) = Option::<Scalar>::from(s.invert()) else {
        return Ok(false);
    };
    let u1 = e * w;
    let u2 = r * w;

    let point = ProjectivePoint::GENERATOR * u1 + ProjectivePoint::from(*public.point()) * u2;
    if bool::from(point.is_identity()) {
        return Ok(false);
    }

    let x = <Scalar as Reduce<U256>>::reduce_bytes(&point.to_affine().x());
    Ok(x == r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Hash;
    use crate::keypair::KeyPair;

    #[test]
    fn test_sign_verify_round_trip() {
        let keypair = KeyPair::generate().unwrap();
        let digest = Hash::digest(b"transfer 100 to bob");
        let signature = keypair.sign(digest.as_bytes()).unwrap();
        assert!(verify_digest(keypair.public_key(), digest.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = KeyPair::generate().unwrap();
        let digest = Hash::digest(b"same input");
        let first = keypair.sign(digest.as_bytes()).unwrap();
        let second = keypair.sign(digest.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flipped_digest_bit_rejected() {
        let keypair = KeyPair::generate().unwrap();
        let digest = Hash::digest(b"original");
        let signature = keypair.sign(digest.as_bytes()).unwrap();

        let mut tampered = digest.to_bytes();
        tampered[0] ^= 0x01;
        assert!(!verify_digest(keypair.public_key(), &tampered, &signature).unwrap());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let digest = Hash::digest(b"who signed this");
        let signature = signer.sign(digest.as_bytes()).unwrap();
        assert!(!verify_digest(other.public_key(), digest.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn test_tampered_signature_rejected() {
        use k256::elliptic_curve::Field;

        let keypair = KeyPair::generate().unwrap();
        let digest = Hash::digest(b"immutable");
        let signature = keypair.sign(digest.as_bytes()).unwrap();

        let bumped_r = EcdsaSignature::new(signature.r() + Scalar::ONE, signature.s());
        assert!(!verify_digest(keypair.public_key(), digest.as_bytes(), &bumped_r).unwrap());

        let bumped_s = EcdsaSignature::new(signature.r(), signature.s() + Scalar::ONE);
        assert!(!verify_digest(keypair.public_key(), digest.as_bytes(), &bumped_s).unwrap());
    }

    #[test]
    fn test_bad_digest_length() {
        let keypair = KeyPair::generate().unwrap();
        let err = keypair.sign(b"short").unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidDigestLength { expected: 32, actual: 5 }
        ));

        let digest = Hash::digest(b"ok");
        let signature = keypair.sign(digest.as_bytes()).unwrap();
        assert!(verify_digest(keypair.public_key(), &digest.as_bytes()[..31], &signature).is_err());
    }

    #[test]
    fn test_signatures_differ_across_digests() {
        let keypair = KeyPair::generate().unwrap();
        let first = keypair.sign(Hash::digest(b"a").as_bytes()).unwrap();
        let second = keypair.sign(Hash::digest(b"b").as_bytes()).unwrap();
        assert_ne!(first, second);
    }
}
