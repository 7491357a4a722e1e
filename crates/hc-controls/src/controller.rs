//! Encrypted controller implementations.
//!
//! Provides the standard controller types over ciphertexts:
//! - **P**: `u = Kp·e`
//! - **PI**: `u = Kp·e + Σ Ki·e·Δt`
//! - **PID**: PI plus `Kd·(e - e_prev)·(1/Δt)`
//!
//! Every `iterate` evaluates all products first and commits state last, so
//! a backend failure leaves the controller exactly as it was.

use crate::context::EvalContext;
use crate::error::{ControlError, ControlResult};
use crate::state::IntegralState;
use crate::terms::{DerivativeTerms, IntegralTerms};
use hc_core::{Ciphertext, EvalParams, HomomorphicEval, ProductCiphertext};
use tracing::{debug, trace};

/// Proportional controller. Stateless apart from its randomness.
#[derive(Debug, Clone)]
pub struct PController<E> {
    kp: Ciphertext,
    ctx: EvalContext<E>,
}

impl<E: HomomorphicEval> PController<E> {
    /// Create a new P controller.
    ///
    /// # Arguments
    ///
    /// * `eval` - Homomorphic backend
    /// * `kp` - Encrypted proportional gain
    /// * `params` - Public evaluation parameters of the session
    pub fn new(eval: E, kp: Ciphertext, params: EvalParams) -> Self {
        Self {
            kp,
            ctx: EvalContext::new(eval, params),
        }
    }

    /// Use reproducible randomness for product rerandomization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.reseed(seed);
        self
    }

    pub fn kp(&self) -> &Ciphertext {
        &self.kp
    }

    pub fn set_kp(&mut self, kp: Ciphertext) {
        self.kp = kp;
    }

    pub fn params(&self) -> &EvalParams {
        self.ctx.params()
    }

    pub fn params_mut(&mut self) -> &mut EvalParams {
        self.ctx.params_mut()
    }

    pub fn set_params(&mut self, params: EvalParams) {
        self.ctx.set_params(params);
    }

    /// Compute the encrypted control output `Kp·e`.
    pub fn iterate(&mut self, error: &Ciphertext) -> ControlResult<ProductCiphertext> {
        trace!("P iterate");
        self.ctx.mul(&self.kp, error)
    }
}

/// Proportional-integral controller.
///
/// Wraps a [`PController`] for the proportional part, which also owns the
/// evaluation context.
#[derive(Debug, Clone)]
pub struct PIController<E> {
    p: PController<E>,
    ki: Ciphertext,
    integral: IntegralState,
}

impl<E: HomomorphicEval> PIController<E> {
    /// Create a new PI controller in the unseeded state.
    ///
    /// # Arguments
    ///
    /// * `eval` - Homomorphic backend
    /// * `kp` - Encrypted proportional gain
    /// * `ki` - Encrypted integral gain
    /// * `params` - Public evaluation parameters of the session
    pub fn new(eval: E, kp: Ciphertext, ki: Ciphertext, params: EvalParams) -> Self {
        Self {
            p: PController::new(eval, kp, params),
            ki,
            integral: IntegralState::Unseeded,
        }
    }

    /// Use reproducible randomness for product rerandomization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.p = self.p.with_seed(seed);
        self
    }

    /// Proportional part of this controller.
    pub fn proportional(&self) -> &PController<E> {
        &self.p
    }

    /// Mutable proportional part, for `set_kp` and the parameter setters.
    pub fn proportional_mut(&mut self) -> &mut PController<E> {
        &mut self.p
    }

    pub fn kp(&self) -> &Ciphertext {
        self.p.kp()
    }

    pub fn ki(&self) -> &Ciphertext {
        &self.ki
    }

    pub fn set_ki(&mut self, ki: Ciphertext) {
        self.ki = ki;
    }

    pub fn params(&self) -> &EvalParams {
        self.p.params()
    }

    /// True once the first sample has seeded the accumulator.
    pub fn is_seeded(&self) -> bool {
        self.integral.is_seeded()
    }

    pub fn integral_state(&self) -> &IntegralState {
        &self.integral
    }

    /// Encrypted integral accumulator, `None` before the first sample.
    pub fn integral(&self) -> Option<&ProductCiphertext> {
        self.integral.accumulator()
    }

    /// Compute `Kp·e + Σ Ki·e·t` and fold this sample into the accumulator.
    pub fn iterate(
        &mut self,
        error: &Ciphertext,
        terms: &IntegralTerms<'_>,
    ) -> ControlResult<ProductCiphertext> {
        let (output, accumulator) = self.evaluate(error, terms)?;
        self.integral.commit(accumulator);
        Ok(output)
    }

    fn ctx(&mut self) -> &mut EvalContext<E> {
        &mut self.p.ctx
    }

    /// Output and next accumulator for this sample; state is untouched.
    fn evaluate(
        &mut self,
        error: &Ciphertext,
        terms: &IntegralTerms<'_>,
    ) -> ControlResult<(ProductCiphertext, ProductCiphertext)> {
        let proportional = self.p.iterate(error)?;
        let contribution = self
            .p
            .ctx
            .mul3(&self.ki, error, terms.timestamp, &terms.cross())?;
        let accumulator = self.integral.advanced(&self.p.ctx, contribution)?;
        let output = self.p.ctx.add(&proportional, &accumulator)?;
        Ok((output, accumulator))
    }
}

/// Proportional-integral-derivative controller.
///
/// The derivative term is differenced against the previous error
/// ciphertext, so it is skipped on the sample that seeds the integral.
#[derive(Debug, Clone)]
pub struct PIDController<E> {
    pi: PIController<E>,
    kd: Ciphertext,
    previous_error: Option<Ciphertext>,
}

impl<E: HomomorphicEval> PIDController<E> {
    /// Create a new PID controller in the unseeded state.
    ///
    /// # Arguments
    ///
    /// * `eval` - Homomorphic backend
    /// * `kp` - Encrypted proportional gain
    /// * `ki` - Encrypted integral gain
    /// * `kd` - Encrypted derivative gain
    /// * `params` - Public evaluation parameters of the session
    pub fn new(
        eval: E,
        kp: Ciphertext,
        ki: Ciphertext,
        kd: Ciphertext,
        params: EvalParams,
    ) -> Self {
        Self {
            pi: PIController::new(eval, kp, ki, params),
            kd,
            previous_error: None,
        }
    }

    /// Use reproducible randomness for product rerandomization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.pi = self.pi.with_seed(seed);
        self
    }

    /// Proportional-integral part of this controller.
    pub fn pi(&self) -> &PIController<E> {
        &self.pi
    }

    /// Mutable PI part, for `set_ki` and everything it delegates.
    pub fn pi_mut(&mut self) -> &mut PIController<E> {
        &mut self.pi
    }

    pub fn kp(&self) -> &Ciphertext {
        self.pi.kp()
    }

    pub fn ki(&self) -> &Ciphertext {
        self.pi.ki()
    }

    pub fn kd(&self) -> &Ciphertext {
        &self.kd
    }

    pub fn set_kd(&mut self, kd: Ciphertext) {
        self.kd = kd;
    }

    pub fn params(&self) -> &EvalParams {
        self.pi.params()
    }

    pub fn is_seeded(&self) -> bool {
        self.pi.is_seeded()
    }

    pub fn integral_state(&self) -> &IntegralState {
        self.pi.integral_state()
    }

    pub fn integral(&self) -> Option<&ProductCiphertext> {
        self.pi.integral()
    }

    /// Error ciphertext supplied to the most recent `iterate`.
    pub fn previous_error(&self) -> Option<&Ciphertext> {
        self.previous_error.as_ref()
    }

    /// Compute the PI output plus `Kd·Δe·(1/Δt)`.
    ///
    /// On the first sample the derivative contributes nothing and
    /// `derivative` is not evaluated.
    pub fn iterate(
        &mut self,
        error: &Ciphertext,
        integral: &IntegralTerms<'_>,
        derivative: &DerivativeTerms<'_>,
    ) -> ControlResult<ProductCiphertext> {
        // Taken before the integral step would flip it.
        let had_history = self.pi.is_seeded();

        let (mut output, accumulator) = self.pi.evaluate(error, integral)?;

        if had_history {
            let previous = self
                .previous_error
                .as_ref()
                .ok_or_else(|| ControlError::StateError {
                    what: "seeded PID controller has no previous error".to_string(),
                })?;
            let ctx = self.pi.ctx();
            let delta = ctx.sub(error, previous)?;
            let term = ctx.mul3(
                &self.kd,
                &delta,
                derivative.inverse_timestamp,
                &derivative.cross(),
            )?;
            output = ctx.add(&output, &term)?;
        } else {
            debug!("first sample, derivative term suppressed");
        }

        self.pi.integral.commit(accumulator);
        self.previous_error = Some(error.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockEval, cross, ct, params, value};

    fn integral_terms<'a>(
        t: &'a Ciphertext,
        it: &'a hc_core::CrossTerm,
        ie: &'a hc_core::CrossTerm,
        te: &'a hc_core::CrossTerm,
    ) -> IntegralTerms<'a> {
        IntegralTerms {
            timestamp: t,
            beta_it: it,
            beta_ie: ie,
            beta_te: te,
        }
    }

    #[test]
    fn p_controller_multiplies_gain_and_error() {
        let mut p = PController::new(MockEval, ct(3, 1), params()).with_seed(1);
        let out = p.iterate(&ct(7, 2)).unwrap();
        assert_eq!(value(&out), 21);
        // No state: same input, same value
        assert_eq!(value(&p.iterate(&ct(7, 2)).unwrap()), 21);
    }

    #[test]
    fn pi_seeds_then_accumulates() {
        let ki = ct(2, 3);
        let mut pi = PIController::new(MockEval, ct(1, 2), ki.clone(), params());
        assert!(!pi.is_seeded());
        assert!(pi.integral().is_none());

        let mut outputs = Vec::new();
        for (i, e) in [5u64, 3, 4].into_iter().enumerate() {
            let e_ct = ct(e, 5 + i as u64);
            let t = ct(1, 11 + i as u64);
            let (it, ie, te) = (cross(&ki, &t), cross(&ki, &e_ct), cross(&t, &e_ct));
            let out = pi
                .iterate(&e_ct, &integral_terms(&t, &it, &ie, &te))
                .unwrap();
            outputs.push(value(&out));
            assert!(pi.is_seeded());
        }
        // accumulators: 10, 16, 24
        assert_eq!(outputs, vec![5 + 10, 3 + 16, 4 + 24]);
        assert_eq!(value(pi.integral().unwrap()), 24);
    }

    #[test]
    fn pi_forwards_cross_terms_in_operand_order() {
        let ki = ct(2, 3);
        let mut pi = PIController::new(MockEval, ct(1, 2), ki.clone(), params());
        let e = ct(5, 7);
        let t = ct(1, 11);
        let (it, ie, te) = (cross(&ki, &t), cross(&ki, &e), cross(&t, &e));

        // beta_it and beta_ie swapped: the mock backend rejects the pairing
        let err = pi
            .iterate(&e, &integral_terms(&t, &ie, &it, &te))
            .unwrap_err();
        assert!(matches!(err, ControlError::Backend(_)));
        assert!(!pi.is_seeded(), "failed iterate must not seed");
    }

    #[test]
    fn pid_suppresses_derivative_on_first_sample_only() {
        let ki = ct(1, 3);
        let kd = ct(4, 13);
        let mut pid = PIDController::new(MockEval, ct(1, 2), ki.clone(), kd.clone(), params());

        let e1 = ct(6, 5);
        let t = ct(1, 11);
        let tinv = ct(1, 17);
        let (it, ie, te) = (cross(&ki, &t), cross(&ki, &e1), cross(&t, &e1));
        // Derivative terms are ignored on the first sample.
        let (dt, de, tde) = (cross(&kd, &tinv), cross(&kd, &e1), cross(&tinv, &e1));
        let d_terms = DerivativeTerms {
            inverse_timestamp: &tinv,
            beta_d_tinv: &dt,
            beta_de: &de,
            beta_tinv_e: &tde,
        };
        let out = pid
            .iterate(&e1, &integral_terms(&t, &it, &ie, &te), &d_terms)
            .unwrap();
        assert_eq!(value(&out), 6 + 6);
        assert_eq!(pid.previous_error(), Some(&e1));

        let e2 = ct(9, 19);
        let t2 = ct(1, 23);
        let tinv2 = ct(1, 29);
        let delta = MockEval::delta(&e2, &e1);
        let (it, ie, te) = (cross(&ki, &t2), cross(&ki, &e2), cross(&t2, &e2));
        let (dt, de, tde) = (cross(&kd, &tinv2), cross(&kd, &delta), cross(&tinv2, &delta));
        let d_terms = DerivativeTerms {
            inverse_timestamp: &tinv2,
            beta_d_tinv: &dt,
            beta_de: &de,
            beta_tinv_e: &tde,
        };
        let out = pid
            .iterate(&e2, &integral_terms(&t2, &it, &ie, &te), &d_terms)
            .unwrap();
        // P = 9, I = 6 + 9, D = 4 * (9 - 6) * 1
        assert_eq!(value(&out), 9 + 15 + 12);
        assert_eq!(pid.previous_error(), Some(&e2));
    }

    #[test]
    fn pid_failure_leaves_state_untouched() {
        let ki = ct(1, 3);
        let kd = ct(4, 13);
        let mut pid = PIDController::new(MockEval, ct(1, 2), ki.clone(), kd.clone(), params());
        let e1 = ct(6, 5);
        let t = ct(1, 11);
        let tinv = ct(1, 17);
        let (it, ie, te) = (cross(&ki, &t), cross(&ki, &e1), cross(&t, &e1));
        let d_terms = DerivativeTerms {
            inverse_timestamp: &tinv,
            beta_d_tinv: &it,
            beta_de: &it,
            beta_tinv_e: &it,
        };
        pid.iterate(&e1, &integral_terms(&t, &it, &ie, &te), &d_terms)
            .unwrap();
        let seeded_integral = pid.integral().cloned();

        // Bad derivative cross terms on the second sample.
        let e2 = ct(9, 19);
        let (it2, ie2, te2) = (cross(&ki, &t), cross(&ki, &e2), cross(&t, &e2));
        let err = pid
            .iterate(&e2, &integral_terms(&t, &it2, &ie2, &te2), &d_terms)
            .unwrap_err();
        assert!(matches!(err, ControlError::Backend(_)));
        assert_eq!(pid.integral().cloned(), seeded_integral);
        assert_eq!(pid.previous_error(), Some(&e1));
    }

    #[test]
    fn setters_do_not_touch_state() {
        let ki = ct(2, 3);
        let mut pi = PIController::new(MockEval, ct(1, 2), ki.clone(), params());
        let e = ct(5, 7);
        let t = ct(1, 11);
        let (it, ie, te) = (cross(&ki, &t), cross(&ki, &e), cross(&t, &e));
        pi.iterate(&e, &integral_terms(&t, &it, &ie, &te)).unwrap();
        let before = pi.integral().cloned();

        pi.proportional_mut().set_kp(ct(100, 2));
        pi.set_ki(ct(100, 3));
        pi.proportional_mut().params_mut().set_msg_bits(20).unwrap();
        assert_eq!(pi.kp(), &ct(100, 2));
        assert_eq!(pi.params().msg_bits(), 20);
        assert_eq!(pi.integral().cloned(), before);
        assert!(pi.is_seeded());
    }
}
