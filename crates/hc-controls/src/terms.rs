//! Per-cycle encrypted inputs of the integral and derivative terms.
//!
//! Cross terms are computed by the key holder from the masks of the current
//! sample and encrypted under the auxiliary scheme. They are forwarded to
//! the backend untouched; pairing them with the wrong sample produces a
//! wrong control output without any error.

use hc_core::{Ciphertext, CrossTerm, TripleCrossTerms};

/// Inputs of the integral contribution `Ki * e * t`.
#[derive(Debug, Clone, Copy)]
pub struct IntegralTerms<'a> {
    /// Elapsed time (or timestamp) of this cycle.
    pub timestamp: &'a Ciphertext,
    /// Ki × timestamp.
    pub beta_it: &'a CrossTerm,
    /// Ki × error.
    pub beta_ie: &'a CrossTerm,
    /// Timestamp × error.
    pub beta_te: &'a CrossTerm,
}

impl<'a> IntegralTerms<'a> {
    /// Cross terms for the product `(Ki, e, t)`.
    pub(crate) fn cross(&self) -> TripleCrossTerms<'a> {
        TripleCrossTerms {
            xy: self.beta_ie,
            xz: self.beta_it,
            yz: self.beta_te,
        }
    }
}

/// Inputs of the derivative contribution `Kd * Δe * (1/Δt)`.
///
/// The error-dependent cross terms must be built from the mask of the
/// error *difference* between this sample and the previous one.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeTerms<'a> {
    /// Reciprocal of the elapsed time.
    pub inverse_timestamp: &'a Ciphertext,
    /// Kd × 1/Δt.
    pub beta_d_tinv: &'a CrossTerm,
    /// Kd × Δerror.
    pub beta_de: &'a CrossTerm,
    /// 1/Δt × Δerror.
    pub beta_tinv_e: &'a CrossTerm,
}

impl<'a> DerivativeTerms<'a> {
    /// Cross terms for the product `(Kd, Δe, 1/Δt)`.
    pub(crate) fn cross(&self) -> TripleCrossTerms<'a> {
        TripleCrossTerms {
            xy: self.beta_de,
            xz: self.beta_d_tinv,
            yz: self.beta_tinv_e,
        }
    }
}
