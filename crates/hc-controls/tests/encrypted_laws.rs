//! Control laws evaluated on real labeled ciphertexts and decrypted by the
//! key holder.

use hc_controls::{
    DerivativeTerms, IntegralTerms, PController, PIController, PIDController,
};
use hc_core::{CrossTerm, PlaintextSpace, ProductCiphertext};
use hc_lhe::{Encrypted, LabeledClient, LabeledEvaluator};
use num_bigint::{BigInt, BigUint};

struct Session {
    client: LabeledClient,
    space: PlaintextSpace,
    kp: Encrypted,
    ki: Encrypted,
    kd: Encrypted,
}

struct Sample {
    error: Encrypted,
    t: Encrypted,
    t_inv: Encrypted,
    it: CrossTerm,
    ie: CrossTerm,
    te: CrossTerm,
    d_tinv: CrossTerm,
    de: CrossTerm,
    tinv_e: CrossTerm,
    delta_mask: BigUint,
}

impl Sample {
    fn integral(&self) -> IntegralTerms<'_> {
        IntegralTerms {
            timestamp: &self.t.ciphertext,
            beta_it: &self.it,
            beta_ie: &self.ie,
            beta_te: &self.te,
        }
    }

    fn derivative(&self) -> DerivativeTerms<'_> {
        DerivativeTerms {
            inverse_timestamp: &self.t_inv.ciphertext,
            beta_d_tinv: &self.d_tinv,
            beta_de: &self.de,
            beta_tinv_e: &self.tinv_e,
        }
    }
}

impl Session {
    fn new(seed: u64, kp: i64, ki: i64, kd: i64) -> Self {
        let mut client = LabeledClient::generate(256, 32, seed).expect("keygen");
        let space = client.plaintext_space();
        let mut enc = |v: i64| {
            let m = space.encode_signed(&BigInt::from(v)).unwrap();
            client.encrypt(&m).unwrap()
        };
        let (kp, ki, kd) = (enc(kp), enc(ki), enc(kd));
        Self {
            client,
            space,
            kp,
            ki,
            kd,
        }
    }

    fn encrypt(&mut self, v: i64) -> Encrypted {
        let m = self.space.encode_signed(&BigInt::from(v)).unwrap();
        self.client.encrypt(&m).unwrap()
    }

    fn sample(&mut self, e: i64, t: i64, t_inv: i64, previous_mask: Option<&BigUint>) -> Sample {
        let error = self.encrypt(e);
        let t = self.encrypt(t);
        let t_inv = self.encrypt(t_inv);
        let delta_mask = match previous_mask {
            Some(prev) => self.client.mask_difference(&error.mask, prev),
            None => error.mask.clone(),
        };
        let it = self.client.cross_term(&self.ki.mask, &t.mask);
        let ie = self.client.cross_term(&self.ki.mask, &error.mask);
        let te = self.client.cross_term(&t.mask, &error.mask);
        let d_tinv = self.client.cross_term(&self.kd.mask, &t_inv.mask);
        let de = self.client.cross_term(&self.kd.mask, &delta_mask);
        let tinv_e = self.client.cross_term(&t_inv.mask, &delta_mask);
        Sample {
            error,
            t,
            t_inv,
            it,
            ie,
            te,
            d_tinv,
            de,
            tinv_e,
            delta_mask,
        }
    }

    fn proportional_offset(&self, s: &Sample) -> BigUint {
        self.client.mask_product(&[&self.kp.mask, &s.error.mask])
    }

    fn integral_offset(&self, s: &Sample) -> BigUint {
        self.client
            .mask_product(&[&self.ki.mask, &s.error.mask, &s.t.mask])
    }

    fn derivative_offset(&self, s: &Sample) -> BigUint {
        self.client
            .mask_product(&[&self.kd.mask, &s.delta_mask, &s.t_inv.mask])
    }

    fn decrypt(&self, c: &ProductCiphertext, offset: &BigUint) -> i64 {
        let m = self.client.decrypt_product(c, offset);
        i64::try_from(&self.space.decode_signed(&m)).unwrap()
    }

    fn params(&self) -> hc_core::EvalParams {
        self.client.eval_params().unwrap()
    }
}

#[test]
fn p_output_decrypts_to_gain_times_error() {
    let mut s = Session::new(1, 3, 0, 0);
    let mut p = PController::new(LabeledEvaluator, s.kp.ciphertext.clone(), s.params());
    for e in [7, -7, 0, 12_345] {
        let sample = s.sample(e, 1, 1, None);
        let out = p.iterate(&sample.error.ciphertext).unwrap();
        assert_eq!(s.decrypt(&out, &s.proportional_offset(&sample)), 3 * e);
    }
}

#[test]
fn pi_seed_then_accumulate() {
    // kp = ki = 1, unit time steps
    let mut s = Session::new(2, 1, 1, 0);
    let mut pi = PIController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.params(),
    )
    .with_seed(5);
    assert!(!pi.is_seeded());

    let mut integral_offset = BigUint::default();
    let mut accumulators = Vec::new();
    let mut outputs = Vec::new();
    for e in [5, 3, -2] {
        let sample = s.sample(e, 1, 1, None);
        let out = pi.iterate(&sample.error.ciphertext, &sample.integral()).unwrap();
        assert!(pi.is_seeded());

        integral_offset = s
            .client
            .mask_sum(&[&integral_offset, &s.integral_offset(&sample)]);
        let acc = pi.integral().expect("seeded");
        accumulators.push(s.decrypt(acc, &integral_offset));

        let out_offset = s
            .client
            .mask_sum(&[&s.proportional_offset(&sample), &integral_offset]);
        outputs.push(s.decrypt(&out, &out_offset));
    }
    assert_eq!(accumulators, vec![5, 8, 6]);
    assert_eq!(outputs, vec![5 + 5, 3 + 8, -2 + 6]);
}

#[test]
fn pi_weights_contribution_by_time() {
    let mut s = Session::new(3, 2, 4, 0);
    let mut pi = PIController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.params(),
    );
    let sample = s.sample(-6, 10, 1, None);
    pi.iterate(&sample.error.ciphertext, &sample.integral()).unwrap();
    let acc = pi.integral().unwrap();
    assert_eq!(s.decrypt(acc, &s.integral_offset(&sample)), 4 * -6 * 10);
}

#[test]
fn pid_first_sample_matches_pi() {
    let mut s = Session::new(4, 2, 3, 5);
    let mut pid = PIDController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.kd.ciphertext.clone(),
        s.params(),
    );
    let sample = s.sample(7, 2, 50, None);
    let out = pid
        .iterate(&sample.error.ciphertext, &sample.integral(), &sample.derivative())
        .unwrap();
    let offset = s
        .client
        .mask_sum(&[&s.proportional_offset(&sample), &s.integral_offset(&sample)]);
    assert_eq!(s.decrypt(&out, &offset), 2 * 7 + 3 * 7 * 2);
}

#[test]
fn pid_derivative_and_previous_error_tracking() {
    let (kp, ki, kd) = (2, 3, 5);
    let mut s = Session::new(5, kp, ki, kd);
    let mut pid = PIDController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.kd.ciphertext.clone(),
        s.params(),
    );

    let errors = [7i64, 4, 10, -3];
    let (t, t_inv) = (2i64, 50i64);
    let mut previous: Option<(i64, BigUint)> = None;
    let mut integral = 0i64;
    let mut integral_offset = BigUint::default();

    for e in errors {
        let sample = s.sample(e, t, t_inv, previous.as_ref().map(|(_, m)| m));
        let out = pid
            .iterate(&sample.error.ciphertext, &sample.integral(), &sample.derivative())
            .unwrap();

        integral += ki * e * t;
        integral_offset = s
            .client
            .mask_sum(&[&integral_offset, &s.integral_offset(&sample)]);
        let mut expected = kp * e + integral;
        let mut offset = s
            .client
            .mask_sum(&[&s.proportional_offset(&sample), &integral_offset]);
        if let Some((e_prev, _)) = previous {
            expected += kd * (e - e_prev) * t_inv;
            offset = s.client.mask_sum(&[&offset, &s.derivative_offset(&sample)]);
        }
        assert_eq!(s.decrypt(&out, &offset), expected, "error {e}");

        let cached = pid.previous_error().expect("cache set after every call");
        assert_eq!(cached, &sample.error.ciphertext);
        let decoded = s.space.decode_signed(&s.client.decrypt(cached));
        assert_eq!(decoded, BigInt::from(e));

        previous = Some((e, sample.error.mask.clone()));
    }
}

#[test]
fn setters_between_calls_leave_state_alone() {
    let mut s = Session::new(6, 1, 1, 1);
    let mut pid = PIDController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.kd.ciphertext.clone(),
        s.params(),
    );
    let first = s.sample(4, 1, 1, None);
    pid.iterate(&first.error.ciphertext, &first.integral(), &first.derivative())
        .unwrap();
    let integral = pid.integral().cloned();
    let cached = pid.previous_error().cloned();

    // New Kp takes effect on the next call only.
    let new_kp = s.encrypt(10);
    let p = pid.pi_mut().proportional_mut();
    p.set_kp(new_kp.ciphertext.clone());
    p.set_params(s.params());
    assert_eq!(pid.integral().cloned(), integral);
    assert_eq!(pid.previous_error().cloned(), cached);

    let second = s.sample(4, 1, 1, Some(&first.error.mask));
    let out = pid
        .iterate(&second.error.ciphertext, &second.integral(), &second.derivative())
        .unwrap();
    let offset = s.client.mask_sum(&[
        &s.client.mask_product(&[&new_kp.mask, &second.error.mask]),
        &s.integral_offset(&first),
        &s.integral_offset(&second),
        &s.derivative_offset(&second),
    ]);
    // 10*4 + (4 + 4) + 1*(4 - 4)*1
    assert_eq!(s.decrypt(&out, &offset), 48);
}

#[test]
fn identical_inputs_decrypt_identically_across_runs() {
    let mut s = Session::new(7, 2, 1, 0);
    let mut a = PIController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.params(),
    )
    .with_seed(1);
    let mut b = PIController::new(
        LabeledEvaluator,
        s.kp.ciphertext.clone(),
        s.ki.ciphertext.clone(),
        s.params(),
    )
    .with_seed(2);

    let mut integral_offset = BigUint::default();
    for e in [9, -1, 3] {
        let sample = s.sample(e, 1, 1, None);
        let out_a = a.iterate(&sample.error.ciphertext, &sample.integral()).unwrap();
        let out_b = b.iterate(&sample.error.ciphertext, &sample.integral()).unwrap();
        assert_ne!(out_a, out_b, "products are rerandomized");

        integral_offset = s
            .client
            .mask_sum(&[&integral_offset, &s.integral_offset(&sample)]);
        let offset = s
            .client
            .mask_sum(&[&s.proportional_offset(&sample), &integral_offset]);
        assert_eq!(s.decrypt(&out_a, &offset), s.decrypt(&out_b, &offset));
    }
}
