//! Evaluation context owned by each controller.

use crate::error::ControlResult;
use hc_core::{Ciphertext, EvalParams, HomomorphicEval, ProductCiphertext, TripleCrossTerms};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

/// Backend, public parameters and randomness for one control session.
///
/// The randomness generator is private to the controller and is passed by
/// exclusive reference into every product evaluation.
#[derive(Debug, Clone)]
pub struct EvalContext<E> {
    eval: E,
    params: EvalParams,
    rng: ChaCha20Rng,
}

impl<E: HomomorphicEval> EvalContext<E> {
    /// Create a context with randomness seeded from the operating system.
    pub fn new(eval: E, params: EvalParams) -> Self {
        Self {
            eval,
            params,
            rng: ChaCha20Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Create a context with reproducible randomness.
    pub fn with_seed(eval: E, params: EvalParams, seed: u64) -> Self {
        Self {
            eval,
            params,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Replace the randomness generator with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    pub fn eval(&self) -> &E {
        &self.eval
    }

    pub fn params(&self) -> &EvalParams {
        &self.params
    }

    /// Mutable access for the individual `N`, `y` and message size setters.
    pub fn params_mut(&mut self) -> &mut EvalParams {
        &mut self.params
    }

    pub fn set_params(&mut self, params: EvalParams) {
        self.params = params;
    }

    pub(crate) fn add(
        &self,
        lhs: &ProductCiphertext,
        rhs: &ProductCiphertext,
    ) -> ControlResult<ProductCiphertext> {
        Ok(self.eval.add(lhs, rhs, &self.params)?)
    }

    pub(crate) fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> ControlResult<Ciphertext> {
        Ok(self.eval.sub(lhs, rhs, &self.params)?)
    }

    pub(crate) fn mul(
        &mut self,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
    ) -> ControlResult<ProductCiphertext> {
        Ok(self.eval.mul(&mut self.rng, lhs, rhs, &self.params)?)
    }

    pub(crate) fn mul3(
        &mut self,
        x: &Ciphertext,
        y: &Ciphertext,
        z: &Ciphertext,
        cross: &TripleCrossTerms<'_>,
    ) -> ControlResult<ProductCiphertext> {
        Ok(self
            .eval
            .mul3(&mut self.rng, x, y, z, cross, &self.params)?)
    }
}
