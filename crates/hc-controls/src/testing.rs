//! Plaintext stand-in for a homomorphic backend, for unit tests.
//!
//! `a` carries the plaintext and `beta` a tag. Cross terms must equal the
//! product of the operand tags, so mismatched forwarding is caught.

use hc_core::{
    Ciphertext, CrossTerm, EvalError, EvalParams, EvalResult, HomomorphicEval, ProductCiphertext,
    TripleCrossTerms,
};
use num_bigint::BigUint;
use rand_core::RngCore;

const BITS: u32 = 16;

fn modulus() -> BigUint {
    BigUint::from(1u32) << BITS
}

pub(crate) fn params() -> EvalParams {
    EvalParams::new(BigUint::from(65_537u32), BigUint::from(3u32), BITS).unwrap()
}

pub(crate) fn ct(m: u64, tag: u64) -> Ciphertext {
    Ciphertext::new(BigUint::from(m), BigUint::from(tag))
}

pub(crate) fn cross(x: &Ciphertext, y: &Ciphertext) -> CrossTerm {
    CrossTerm::new(x.beta() * y.beta() % modulus())
}

pub(crate) fn value(p: &ProductCiphertext) -> u64 {
    u64::try_from(p.value()).unwrap()
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MockEval;

impl MockEval {
    pub(crate) fn delta(lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        let m = modulus();
        Ciphertext::new(
            (lhs.a() + &m - rhs.a()) % &m,
            (lhs.beta() + &m - rhs.beta()) % &m,
        )
    }
}

impl HomomorphicEval for MockEval {
    fn add(
        &self,
        lhs: &ProductCiphertext,
        rhs: &ProductCiphertext,
        _params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        Ok(ProductCiphertext::new((lhs.value() + rhs.value()) % modulus()))
    }

    fn sub(
        &self,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        _params: &EvalParams,
    ) -> EvalResult<Ciphertext> {
        Ok(Self::delta(lhs, rhs))
    }

    fn mul<R: RngCore + ?Sized>(
        &self,
        _rng: &mut R,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        _params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        Ok(ProductCiphertext::new(lhs.a() * rhs.a() % modulus()))
    }

    fn mul3<R: RngCore + ?Sized>(
        &self,
        _rng: &mut R,
        x: &Ciphertext,
        y: &Ciphertext,
        z: &Ciphertext,
        cross_terms: &TripleCrossTerms<'_>,
        _params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        let m = modulus();
        let paired = [
            (cross_terms.xy, x, y),
            (cross_terms.xz, x, z),
            (cross_terms.yz, y, z),
        ];
        for (term, lhs, rhs) in paired {
            if *term.value() != lhs.beta() * rhs.beta() % &m {
                return Err(EvalError::InvalidArg {
                    what: "cross term does not match operands",
                });
            }
        }
        Ok(ProductCiphertext::new(x.a() * y.a() % &m * z.a() % &m))
    }
}
