//! Encrypted closed loop.
//!
//! Each cycle plays both roles of the protocol: the key holder encrypts the
//! error (and, for PI/PID, the time step and its reciprocal) under fresh
//! labels and builds the cross terms; the controller evaluates on
//! ciphertexts only; the key holder decrypts with the mask offset of the
//! evaluated expression and drives the plant.

use crate::config::LoopConfig;
use crate::error::SimResult;
use crate::plant::FirstOrderPlant;
use crate::record::{LoopRecord, LoopSample};
use hc_controls::{
    ControlInput, ControlLaw, DerivativeTerms, EncryptedGains, IntegralTerms,
};
use hc_core::{CrossTerm, PlaintextSpace};
use hc_lhe::{Encrypted, KeyPair, LabeledClient, LabeledEvaluator};
use num_bigint::BigUint;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

/// A gain as a plaintext residue and its encryption.
struct Gain {
    plain: BigUint,
    encrypted: Encrypted,
}

/// Error of the previous cycle, as the key holder knows it.
struct PreviousError {
    plain: BigUint,
    mask: BigUint,
}

struct IntegralInputs {
    timestep: Encrypted,
    it: CrossTerm,
    ie: CrossTerm,
    te: CrossTerm,
}

impl IntegralInputs {
    fn terms(&self) -> IntegralTerms<'_> {
        IntegralTerms {
            timestamp: &self.timestep.ciphertext,
            beta_it: &self.it,
            beta_ie: &self.ie,
            beta_te: &self.te,
        }
    }
}

struct DerivativeInputs {
    inverse_timestep: Encrypted,
    delta_mask: BigUint,
    d_tinv: CrossTerm,
    de: CrossTerm,
    tinv_e: CrossTerm,
}

impl DerivativeInputs {
    fn terms(&self) -> DerivativeTerms<'_> {
        DerivativeTerms {
            inverse_timestamp: &self.inverse_timestep.ciphertext,
            beta_d_tinv: &self.d_tinv,
            beta_de: &self.de,
            beta_tinv_e: &self.tinv_e,
        }
    }
}

pub struct EncryptedLoop {
    config: LoopConfig,
    client: LabeledClient,
    space: PlaintextSpace,
    law: ControlLaw<LabeledEvaluator>,
    kp: Gain,
    ki: Gain,
    kd: Gain,
    timestep: BigUint,
    inverse_timestep: BigUint,
    plant: FirstOrderPlant,
    setpoint: f64,
    step: usize,
    integral_mask: BigUint,
    integral_plain: BigUint,
    previous: Option<PreviousError>,
}

impl EncryptedLoop {
    /// Generate keys, encrypt the gains and build the controller.
    pub fn new(config: LoopConfig) -> SimResult<Self> {
        config.validate()?;

        let mut seeder = match config.crypto.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_rng(&mut rand::rng()),
        };
        let keys = KeyPair::generate(&mut seeder, config.crypto.key_bits, config.crypto.msg_bits)?;
        info!(
            key_bits = config.crypto.key_bits,
            msg_bits = config.crypto.msg_bits,
            kind = %config.kind,
            "generated session keys"
        );
        let client_rng = ChaCha20Rng::seed_from_u64(seeder.next_u64());
        let controller_seed = seeder.next_u64();
        let mut client = LabeledClient::new(keys, client_rng);
        let space = client.plaintext_space();

        let scaling = &config.scaling;
        let gains = &config.gains;
        let kp = encrypt_gain(&mut client, space, gains.kp * scaling.gain)?;
        let ki = encrypt_gain(&mut client, space, gains.ki * scaling.gain / scaling.time)?;
        let kd = encrypt_gain(&mut client, space, gains.kd * scaling.gain / scaling.time)?;
        let timestep = space.encode_fixed((config.sample_period * scaling.time).round(), 1.0)?;
        let inverse_timestep =
            space.encode_fixed((scaling.time / config.sample_period).round(), 1.0)?;

        let law = ControlLaw::new(
            config.kind,
            LabeledEvaluator,
            EncryptedGains {
                kp: kp.encrypted.ciphertext.clone(),
                ki: Some(ki.encrypted.ciphertext.clone()),
                kd: Some(kd.encrypted.ciphertext.clone()),
            },
            client.eval_params()?,
        )?
        .with_seed(controller_seed);

        let plant = FirstOrderPlant::new(
            config.plant.pole,
            config.plant.input_gain,
            config.plant.initial_state,
        )?;
        let setpoint = config.setpoint.value;

        Ok(Self {
            config,
            client,
            space,
            law,
            kp,
            ki,
            kd,
            timestep,
            inverse_timestep,
            plant,
            setpoint,
            step: 0,
            integral_mask: BigUint::default(),
            integral_plain: BigUint::default(),
            previous: None,
        })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn law(&self) -> &ControlLaw<LabeledEvaluator> {
        &self.law
    }

    pub fn client(&self) -> &LabeledClient {
        &self.client
    }

    pub fn plant(&self) -> &FirstOrderPlant {
        &self.plant
    }

    /// Run one control cycle.
    pub fn step(&mut self) -> SimResult<LoopSample> {
        let step = self.step;
        if let Some(every) = self.config.setpoint.flip_every {
            if step != 0 && step % every == 0 {
                self.setpoint = -self.setpoint;
                info!(step, setpoint = self.setpoint, "flipping setpoint");
            }
        }

        let kind = self.law.kind();
        let state = self.plant.state;
        let error = self.setpoint - state;
        let error_plain = self.space.encode_fixed(error, self.config.scaling.error)?;
        let error_ct = self.client.encrypt(&error_plain)?;

        let integral = if kind.has_integral() {
            Some(self.integral_inputs(&error_ct)?)
        } else {
            None
        };
        let derivative = if kind.has_derivative() {
            Some(self.derivative_inputs(&error_ct)?)
        } else {
            None
        };

        let input = ControlInput {
            error: &error_ct.ciphertext,
            integral: integral.as_ref().map(IntegralInputs::terms),
            derivative: derivative.as_ref().map(DerivativeInputs::terms),
        };
        let output = self.law.iterate(&input)?;

        // Key holder: the same expression over masks and over plaintexts.
        let modulus = self.space.modulus();
        let mut offset = self
            .client
            .mask_product(&[&self.kp.encrypted.mask, &error_ct.mask]);
        let mut reference = &self.kp.plain * &error_plain % &modulus;

        if let Some(inputs) = &integral {
            let contribution_mask = self.client.mask_product(&[
                &self.ki.encrypted.mask,
                &error_ct.mask,
                &inputs.timestep.mask,
            ]);
            self.integral_mask = self
                .client
                .mask_sum(&[&self.integral_mask, &contribution_mask]);
            self.integral_plain = (&self.integral_plain
                + &self.ki.plain * &error_plain % &modulus * &self.timestep)
                % &modulus;
            offset = self.client.mask_sum(&[&offset, &self.integral_mask]);
            reference = (reference + &self.integral_plain) % &modulus;
        }

        if let (Some(inputs), Some(previous)) = (&derivative, &self.previous) {
            let term_mask = self.client.mask_product(&[
                &self.kd.encrypted.mask,
                &inputs.delta_mask,
                &inputs.inverse_timestep.mask,
            ]);
            offset = self.client.mask_sum(&[&offset, &term_mask]);
            let delta_plain = (&error_plain + &modulus - &previous.plain) % &modulus;
            reference = (reference
                + &self.kd.plain * delta_plain % &modulus * &self.inverse_timestep)
                % &modulus;
        }

        self.previous = Some(PreviousError {
            plain: error_plain,
            mask: error_ct.mask.clone(),
        });

        let decrypted = self.client.decrypt_product(&output, &offset);
        let exact = decrypted == reference;
        if !exact {
            warn!(step, "decrypted output differs from plaintext evaluation");
        }

        let output_scale = self.config.scaling.output();
        let u = self.space.decode_fixed(&decrypted, output_scale);
        let reference_u = self.space.decode_fixed(&reference, output_scale);
        let next_state = self.plant.step(u);
        debug!(step, error, u, next_state, "control cycle");

        self.step += 1;
        Ok(LoopSample {
            step,
            time: step as f64 * self.config.sample_period,
            setpoint: self.setpoint,
            state,
            error,
            output: u,
            reference_output: reference_u,
            next_state,
            exact,
        })
    }

    /// Run the configured number of cycles.
    pub fn run(&mut self) -> SimResult<LoopRecord> {
        self.run_with_progress(None)
    }

    /// Run the configured number of cycles, reporting each sample.
    pub fn run_with_progress(
        &mut self,
        mut progress: Option<&mut dyn FnMut(&LoopSample)>,
    ) -> SimResult<LoopRecord> {
        let mut record = LoopRecord::default();
        while self.step < self.config.steps {
            let sample = self.step()?;
            if let Some(cb) = progress.as_deref_mut() {
                cb(&sample);
            }
            record.samples.push(sample);
        }
        info!(
            steps = record.len(),
            exact = record.all_exact(),
            final_state = record.final_state(),
            "loop finished"
        );
        Ok(record)
    }

    fn integral_inputs(&mut self, error: &Encrypted) -> SimResult<IntegralInputs> {
        let timestep = self.client.encrypt(&self.timestep)?;
        let ki_mask = &self.ki.encrypted.mask;
        let it = self.client.cross_term(ki_mask, &timestep.mask);
        let ie = self.client.cross_term(ki_mask, &error.mask);
        let te = self.client.cross_term(&timestep.mask, &error.mask);
        Ok(IntegralInputs {
            timestep,
            it,
            ie,
            te,
        })
    }

    fn derivative_inputs(&mut self, error: &Encrypted) -> SimResult<DerivativeInputs> {
        let inverse_timestep = self.client.encrypt(&self.inverse_timestep)?;
        // Unused by the controller on the first sample.
        let delta_mask = match &self.previous {
            Some(previous) => self.client.mask_difference(&error.mask, &previous.mask),
            None => error.mask.clone(),
        };
        let kd_mask = &self.kd.encrypted.mask;
        let d_tinv = self.client.cross_term(kd_mask, &inverse_timestep.mask);
        let de = self.client.cross_term(kd_mask, &delta_mask);
        let tinv_e = self.client.cross_term(&inverse_timestep.mask, &delta_mask);
        Ok(DerivativeInputs {
            inverse_timestep,
            delta_mask,
            d_tinv,
            de,
            tinv_e,
        })
    }
}

fn encrypt_gain(client: &mut LabeledClient, space: PlaintextSpace, scaled: f64) -> SimResult<Gain> {
    let plain = space.encode_fixed(scaled.round(), 1.0)?;
    let encrypted = client.encrypt(&plain)?;
    Ok(Gain { plain, encrypted })
}

/// Build a loop from `config` and run it to completion.
pub fn run_loop(config: &LoopConfig) -> SimResult<LoopRecord> {
    EncryptedLoop::new(config.clone())?.run()
}

impl core::fmt::Debug for EncryptedLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncryptedLoop")
            .field("kind", &self.law.kind())
            .field("step", &self.step)
            .field("setpoint", &self.setpoint)
            .field("state", &self.plant.state)
            .finish()
    }
}
