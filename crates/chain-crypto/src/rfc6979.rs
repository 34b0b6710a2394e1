// chain-crypto/src/rfc6979.rs

//! Deterministic ECDSA nonce derivation, RFC 6979 section 3.2.
//!
//! The nonce `k` is drawn from an HMAC-SHA256 DRBG seeded with the private
//! scalar and the message digest, so the same signing input always produces
//! the same signature and no secure random source is consulted at signing
//! time. For secp256k1 the hash and scalar widths coincide (32 bytes), so
//! one HMAC block yields one candidate.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{FieldBytes, Scalar, U256};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 output octets (`holen`), also the scalar width (`rolen`).
const HLEN: usize = 32;

fn hmac(key: &[u8], parts: &[&[u8]]) -> [u8; HLEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// `bits2octets(digest, n)`: the digest value reduced mod `n`, re-encoded in
/// scalar width (sections 2.3.2-2.3.4; the bits2int shift is a no-op here
/// because the digest already has the order's bit length).
fn bits2octets(digest: &[u8; 32]) -> [u8; HLEN] {
    let reduced = <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*digest));
    reduced.to_bytes().into()
}

/// HMAC-DRBG state producing the candidate nonce sequence for one
/// `(d, digest)` signing input.
pub struct NonceSequence {
    k: [u8; HLEN],
    v: [u8; HLEN],
    primed: bool,
}

impl NonceSequence {
    /// Steps B through G: seed the state from
    /// `int2octets(d) || bits2octets(digest, n)`.
    pub fn new(d: &Scalar, digest: &[u8; 32]) -> Self {
        let int2octets: [u8; HLEN] = d.to_bytes().into();
        let bits2octets = bits2octets(digest);

        let v = [0x01u8; HLEN]; // step B
        let k = [0x00u8; HLEN]; // step C
        let k = hmac(&k, &[v.as_slice(), &[0x00], &int2octets, &bits2octets]); // step D
        let v = hmac(&k, &[v.as_slice()]); // step E
        let k = hmac(&k, &[v.as_slice(), &[0x01], &int2octets, &bits2octets]); // step F
        let v = hmac(&k, &[v.as_slice()]); // step G

        Self { k, v, primed: false }
    }

    /// Step H: the next candidate `k` in `[1, n-1]`.
    ///
    /// Out-of-range candidates are rejected and the state updated per the
    /// standard. A caller that discards a returned candidate (zero `r` or
    /// `s`) calls this again; the same update runs before the next draw.
    pub fn next(&mut self) -> Scalar {
        if self.primed {
            self.update();
        }
        self.primed = true;
        loop {
            self.v = hmac(&self.k, &[self.v.as_slice()]);
            let candidate: Option<Scalar> = Scalar::from_repr(FieldBytes::from(self.v)).into();
            if let Some(k) = candidate {
                if !bool::from(k.is_zero()) {
                    return k;
                }
            }
            self.update();
        }
    }

    fn update(&mut self) {
        self.k = hmac(&self.k, &[self.v.as_slice(), &[0x00]]);
        self.v = hmac(&self.k, &[self.v.as_slice()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(byte: u8) -> Scalar {
        let mut repr = FieldBytes::default();
        repr[31] = byte;
        Scalar::from_repr(repr).unwrap()
    }

    #[test]
    fn test_same_input_same_nonce() {
        let d = scalar(7);
        let digest = [0xabu8; 32];
        let k1 = NonceSequence::new(&d, &digest).next();
        let k2 = NonceSequence::new(&d, &digest).next();
        assert_eq!(k1, k2);
        assert!(!bool::from(k1.is_zero()));
    }

    #[test]
    fn test_different_digest_different_nonce() {
        let d = scalar(7);
        let k1 = NonceSequence::new(&d, &[0x01u8; 32]).next();
        let k2 = NonceSequence::new(&d, &[0x02u8; 32]).next();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_different_key_different_nonce() {
        let digest = [0x55u8; 32];
        let k1 = NonceSequence::new(&scalar(7), &digest).next();
        let k2 = NonceSequence::new(&scalar(8), &digest).next();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_candidate_sequence_advances() {
        let mut nonces = NonceSequence::new(&scalar(7), &[0xcdu8; 32]);
        let first = nonces.next();
        let second = nonces.next();
        assert_ne!(first, second);

        // the second candidate is itself deterministic
        let mut replay = NonceSequence::new(&scalar(7), &[0xcdu8; 32]);
        replay.next();
        assert_eq!(replay.next(), second);
    }
}
