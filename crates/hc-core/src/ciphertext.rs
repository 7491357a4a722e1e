//! Ciphertext value types.
//!
//! The controllers never look inside these: they store, clone and forward
//! them to a [`HomomorphicEval`](crate::HomomorphicEval) backend. Fields are
//! private so that only constructors and accessors touch the components.

use core::fmt;
use num_bigint::BigUint;

/// Level-1 ciphertext of one scalar under a one-time label.
///
/// `a` is the label-masked plaintext and `beta` the encryption of the mask.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext {
    a: BigUint,
    beta: BigUint,
}

impl Ciphertext {
    pub fn new(a: BigUint, beta: BigUint) -> Self {
        Self { a, beta }
    }

    pub fn a(&self) -> &BigUint {
        &self.a
    }

    pub fn beta(&self) -> &BigUint {
        &self.beta
    }

    pub fn into_parts(self) -> (BigUint, BigUint) {
        (self.a, self.beta)
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ciphertext(a: {} bits, beta: {} bits)",
            self.a.bits(),
            self.beta.bits()
        )
    }
}

/// Level-2 ciphertext produced by homomorphic multiplication.
///
/// Control outputs and the integral accumulator have this shape; sums of
/// products stay at this level.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProductCiphertext(BigUint);

impl ProductCiphertext {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }
}

impl fmt::Debug for ProductCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductCiphertext({} bits)", self.0.bits())
    }
}

/// Pairwise mask product, encrypted under the auxiliary single-operand
/// scheme by whoever holds the masks.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CrossTerm(BigUint);

impl CrossTerm {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for CrossTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CrossTerm({} bits)", self.0.bits())
    }
}

/// Cross terms for a three-operand product `x * y * z`.
///
/// Each entry must be the encrypted product of the masks of the two named
/// operands; a mismatched pairing decrypts to a wrong value without any
/// detectable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleCrossTerms<'a> {
    pub xy: &'a CrossTerm,
    pub xz: &'a CrossTerm,
    pub yz: &'a CrossTerm,
}
