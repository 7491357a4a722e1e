//! Homomorphic evaluation contract.
//!
//! Controllers are generic over this trait and never inspect ciphertext
//! contents. All results are reduced modulo the public modulus `N`.

use crate::ciphertext::{Ciphertext, ProductCiphertext, TripleCrossTerms};
use crate::error::EvalResult;
use crate::params::EvalParams;
use rand_core::RngCore;

pub trait HomomorphicEval {
    /// Sum of two products. Exact, no rerandomization.
    fn add(
        &self,
        lhs: &ProductCiphertext,
        rhs: &ProductCiphertext,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext>;

    /// Difference `lhs - rhs` of two level-1 ciphertexts. The mask of the
    /// result is the difference of the operand masks.
    fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext, params: &EvalParams)
    -> EvalResult<Ciphertext>;

    /// Two-operand product. Rerandomized with `rng`.
    fn mul<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext>;

    /// Three-operand product `x * y * z`.
    ///
    /// `cross` must hold the encrypted pairwise mask products of exactly
    /// these operands, in `xy`, `xz`, `yz` order. Rerandomized with `rng`.
    fn mul3<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        x: &Ciphertext,
        y: &Ciphertext,
        z: &Ciphertext,
        cross: &TripleCrossTerms<'_>,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext>;
}
