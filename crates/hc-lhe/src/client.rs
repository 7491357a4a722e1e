//! Key holder side of a labeled HE session.
//!
//! The client encrypts inputs under fresh labels, builds the cross terms the
//! three-operand product needs, and decrypts evaluated products once the
//! caller supplies the mask offset of the evaluated expression (the same
//! expression evaluated over the masks instead of the plaintexts).

use crate::error::{LheError, LheResult};
use crate::joye_libert::KeyPair;
use crate::labeled::MaskKey;
use hc_core::{Ciphertext, CrossTerm, EvalParams, PlaintextSpace, ProductCiphertext};
use num_bigint::BigUint;
use num_traits::One;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::collections::HashSet;

/// A fresh encryption together with its label and mask.
#[derive(Debug, Clone)]
pub struct Encrypted {
    pub ciphertext: Ciphertext,
    pub label: u64,
    pub mask: BigUint,
}

pub struct LabeledClient {
    keys: KeyPair,
    mask_key: MaskKey,
    rng: ChaCha20Rng,
    next_label: u64,
    used_labels: HashSet<u64>,
}

impl core::fmt::Debug for LabeledClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabeledClient")
            .field("public", &self.keys.public)
            .field("labels_used", &self.used_labels.len())
            .finish()
    }
}

impl LabeledClient {
    /// Build a client around existing keys; the mask key is drawn from `rng`.
    pub fn new(keys: KeyPair, mut rng: ChaCha20Rng) -> Self {
        let mask_key = MaskKey::random(&mut rng);
        Self {
            keys,
            mask_key,
            rng,
            next_label: 1,
            used_labels: HashSet::new(),
        }
    }

    /// Generate keys and a client from a single seed.
    pub fn generate(key_bits: u64, msg_bits: u32, seed: u64) -> LheResult<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let keys = KeyPair::generate(&mut rng, key_bits, msg_bits)?;
        Ok(Self::new(keys, rng))
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    pub fn eval_params(&self) -> LheResult<EvalParams> {
        self.keys.public.eval_params()
    }

    pub fn plaintext_space(&self) -> PlaintextSpace {
        PlaintextSpace::new(self.keys.public.msg_bits())
    }

    pub fn mask(&self, label: u64) -> BigUint {
        self.mask_key.mask(label, self.keys.public.msg_bits())
    }

    /// Encrypt under the next unused label.
    pub fn encrypt(&mut self, m: &BigUint) -> LheResult<Encrypted> {
        while self.used_labels.contains(&self.next_label) {
            self.next_label += 1;
        }
        let label = self.next_label;
        self.next_label += 1;
        self.encrypt_labeled(m, label)
    }

    /// Encrypt under an explicit label. A label can be used once only.
    pub fn encrypt_labeled(&mut self, m: &BigUint, label: u64) -> LheResult<Encrypted> {
        if !self.used_labels.insert(label) {
            return Err(LheError::LabelReused { label });
        }
        let space = self.plaintext_space();
        let modulus = space.modulus();
        let mask = self.mask(label);
        let a = (m % &modulus + &modulus - &mask) % &modulus;
        let beta = self.keys.public.encrypt(&mut self.rng, &mask);
        Ok(Encrypted {
            ciphertext: Ciphertext::new(a, beta),
            label,
            mask,
        })
    }

    /// Encrypt the product of two masks under the auxiliary scheme.
    pub fn cross_term(&mut self, lhs_mask: &BigUint, rhs_mask: &BigUint) -> CrossTerm {
        let product = self.mask_product(&[lhs_mask, rhs_mask]);
        CrossTerm::new(self.keys.public.encrypt(&mut self.rng, &product))
    }

    /// Product of masks reduced into the plaintext space.
    pub fn mask_product(&self, masks: &[&BigUint]) -> BigUint {
        let modulus = self.plaintext_space().modulus();
        masks
            .iter()
            .fold(BigUint::one(), |acc, m| acc * *m % &modulus)
    }

    /// Mask of `lhs - rhs`, matching the evaluator's subtraction.
    pub fn mask_difference(&self, lhs: &BigUint, rhs: &BigUint) -> BigUint {
        let modulus = self.plaintext_space().modulus();
        (lhs % &modulus + &modulus - rhs % &modulus) % &modulus
    }

    /// Sum of offsets reduced into the plaintext space.
    pub fn mask_sum(&self, offsets: &[&BigUint]) -> BigUint {
        let modulus = self.plaintext_space().modulus();
        offsets
            .iter()
            .fold(BigUint::default(), |acc, o| (acc + *o) % &modulus)
    }

    /// Decrypt a level-1 ciphertext.
    pub fn decrypt(&self, c: &Ciphertext) -> BigUint {
        let modulus = self.plaintext_space().modulus();
        (c.a() + self.keys.secret.decrypt(c.beta())) % &modulus
    }

    /// Decrypt a product, adding back the mask offset of its expression.
    pub fn decrypt_product(&self, c: &ProductCiphertext, offset: &BigUint) -> BigUint {
        let modulus = self.plaintext_space().modulus();
        (self.keys.secret.decrypt(c.value()) + offset) % &modulus
    }
}
