//! Labeled HE on top of Joye–Libert.
//!
//! A level-1 ciphertext of `m` under label `l` is `(a, beta)` with
//! `a = m - b (mod 2^k)`, `b = F(K, l)` and `beta = JL.Enc(b)`. Products are
//! Joye–Libert ciphertexts of `m1 * m2 - b1 * b2`; the key holder adds the
//! mask product back on decryption.

use crate::joye_libert::encrypt_raw;
use hc_core::{
    Ciphertext, EvalError, EvalParams, EvalResult, HomomorphicEval, ProductCiphertext,
    TripleCrossTerms,
};
use num_bigint::BigUint;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use tracing::trace;

/// Secret PRF key deriving one-time masks from labels.
///
/// Each label selects an independent ChaCha20 stream.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskKey([u8; 32]);

impl core::fmt::Debug for MaskKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("MaskKey(..)")
    }
}

impl MaskKey {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(seed)
    }

    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self(seed)
    }

    /// Mask `b = F(K, label)` in Z_{2^k}.
    pub fn mask(&self, label: u64, msg_bits: u32) -> BigUint {
        let mut stream = ChaCha20Rng::from_seed(self.0);
        stream.set_stream(label);
        let mut bytes = vec![0u8; (msg_bits as usize).div_ceil(8)];
        stream.fill_bytes(&mut bytes);
        BigUint::from_bytes_le(&bytes) % (BigUint::from(1u32) << msg_bits)
    }
}

/// Stateless evaluator for labeled ciphertexts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabeledEvaluator;

impl LabeledEvaluator {
    fn inverse(value: &BigUint, params: &EvalParams) -> EvalResult<BigUint> {
        value
            .modinv(params.modulus())
            .ok_or(EvalError::NotInvertible { what: "beta" })
    }
}

impl HomomorphicEval for LabeledEvaluator {
    fn add(
        &self,
        lhs: &ProductCiphertext,
        rhs: &ProductCiphertext,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        let n = params.modulus();
        Ok(ProductCiphertext::new(lhs.value() * rhs.value() % n))
    }

    fn sub(
        &self,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        params: &EvalParams,
    ) -> EvalResult<Ciphertext> {
        let m = params.plaintext_modulus();
        let n = params.modulus();
        let a = (lhs.a() % &m + &m - rhs.a() % &m) % &m;
        let beta = lhs.beta() * Self::inverse(rhs.beta(), params)? % n;
        Ok(Ciphertext::new(a, beta))
    }

    fn mul<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        let m = params.plaintext_modulus();
        let n = params.modulus();
        let (a1, a2) = (lhs.a() % &m, rhs.a() % &m);

        let masked = encrypt_raw(rng, n, params.y(), params.msg_bits(), &(&a1 * &a2 % &m));
        let c = masked * lhs.beta().modpow(&a2, n) % n * rhs.beta().modpow(&a1, n) % n;
        trace!(bits = c.bits(), "evaluated two-operand product");
        Ok(ProductCiphertext::new(c))
    }

    fn mul3<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        x: &Ciphertext,
        y: &Ciphertext,
        z: &Ciphertext,
        cross: &TripleCrossTerms<'_>,
        params: &EvalParams,
    ) -> EvalResult<ProductCiphertext> {
        let m = params.plaintext_modulus();
        let n = params.modulus();
        let (a1, a2, a3) = (x.a() % &m, y.a() % &m, z.a() % &m);
        let a12 = &a1 * &a2 % &m;
        let a13 = &a1 * &a3 % &m;
        let a23 = &a2 * &a3 % &m;

        // (a1 + b1)(a2 + b2)(a3 + b3) minus the b1*b2*b3 term
        let mut c = encrypt_raw(rng, n, params.y(), params.msg_bits(), &(&a12 * &a3 % &m));
        for (base, exp) in [
            (x.beta(), &a23),
            (y.beta(), &a13),
            (z.beta(), &a12),
            (cross.xy.value(), &a3),
            (cross.xz.value(), &a2),
            (cross.yz.value(), &a1),
        ] {
            c = c * base.modpow(exp, n) % n;
        }
        trace!(bits = c.bits(), "evaluated three-operand product");
        Ok(ProductCiphertext::new(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_deterministic_per_label() {
        let key = MaskKey::from_seed([3u8; 32]);
        assert_eq!(key.mask(5, 32), key.mask(5, 32));
        assert_ne!(key.mask(5, 32), key.mask(6, 32));
        assert!(key.mask(5, 12) < BigUint::from(4096u32));
    }

    #[test]
    fn different_keys_give_different_masks() {
        let k1 = MaskKey::from_seed([1u8; 32]);
        let k2 = MaskKey::from_seed([2u8; 32]);
        assert_ne!(k1.mask(1, 64), k2.mask(1, 64));
    }
}
