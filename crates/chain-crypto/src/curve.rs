// chain-crypto/src/curve.rs

use k256::elliptic_curve::bigint::ArrayEncoding;
use k256::elliptic_curve::{Curve, PrimeField};
use k256::{FieldBytes, ProjectivePoint, Scalar, Secp256k1};
use num_bigint::BigUint;

/// Width in bytes of a serialized curve scalar
pub const SCALAR_SIZE: usize = 32;

/// Immutable secp256k1 domain parameters.
///
/// Constructed once at startup and passed by reference wherever the order is
/// needed; there is no hidden global registration. The order is exposed as a
/// `BigUint` because the signature wire format deals in variable-length
/// integers, while all signing math stays in curve scalars.
#[derive(Debug, Clone)]
pub struct CurveDomain {
    order: BigUint,
    half_order: BigUint,
}

impl CurveDomain {
    /// The secp256k1 domain used for every key and signature in the client.
    pub fn secp256k1() -> Self {
        let order = BigUint::from_bytes_be(Secp256k1::ORDER.to_be_byte_array().as_slice());
        let half_order = &order >> 1;
        Self { order, half_order }
    }

    /// Subgroup order `n`.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    /// `n / 2`, the low-S boundary.
    pub fn half_order(&self) -> &BigUint {
        &self.half_order
    }

    /// Base point `G`.
    pub fn generator(&self) -> ProjectivePoint {
        ProjectivePoint::GENERATOR
    }
}

impl Default for CurveDomain {
    fn default() -> Self {
        Self::secp256k1()
    }
}

/// Canonical unsigned integer value of a scalar.
pub fn scalar_to_biguint(scalar: &Scalar) -> BigUint {
    BigUint::from_bytes_be(scalar.to_bytes().as_slice())
}

/// Scalar for an unsigned integer, `None` if the value is not below `n`.
pub fn biguint_to_scalar(value: &BigUint) -> Option<Scalar> {
    let bytes = value.to_bytes_be();
    if bytes.len() > SCALAR_SIZE {
        return None;
    }
    let mut repr = FieldBytes::default();
    repr[SCALAR_SIZE - bytes.len()..].copy_from_slice(&bytes);
    Scalar::from_repr(repr).into()
}
