//! Integral accumulator state machine.
//!
//! UNSEEDED until the first sample, SEEDED from then on. There is no way
//! back: a new control session needs a new controller.

use crate::context::EvalContext;
use crate::error::ControlResult;
use hc_core::{HomomorphicEval, ProductCiphertext};
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IntegralState {
    /// No sample seen yet. The accumulator must not be read.
    #[default]
    Unseeded,
    /// Running homomorphic sum of all integral contributions so far.
    Seeded(ProductCiphertext),
}

impl IntegralState {
    /// Whether at least one sample has been absorbed.
    pub fn is_seeded(&self) -> bool {
        matches!(self, Self::Seeded(_))
    }

    pub fn accumulator(&self) -> Option<&ProductCiphertext> {
        match self {
            Self::Unseeded => None,
            Self::Seeded(acc) => Some(acc),
        }
    }

    /// Accumulator value after absorbing `contribution`, without committing.
    ///
    /// Seeds with the contribution itself when unseeded.
    pub(crate) fn advanced<E: HomomorphicEval>(
        &self,
        ctx: &EvalContext<E>,
        contribution: ProductCiphertext,
    ) -> ControlResult<ProductCiphertext> {
        match self {
            Self::Unseeded => {
                debug!("seeding integral accumulator");
                Ok(contribution)
            }
            Self::Seeded(acc) => {
                trace!("adding integral contribution");
                ctx.add(acc, &contribution)
            }
        }
    }

    pub(crate) fn commit(&mut self, accumulator: ProductCiphertext) {
        *self = Self::Seeded(accumulator);
    }
}
