//! Mapping of control-loop values into the plaintext space Z_{2^k}.
//!
//! Signed values use the two's-complement convention: residues at or above
//! `2^(k-1)` represent negatives. Real values are fixed-point encoded by a
//! caller-chosen scale and truncated toward zero.

use crate::error::{EvalError, EvalResult};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{FromPrimitive, One, ToPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaintextSpace {
    bits: u32,
}

impl PlaintextSpace {
    pub fn new(bits: u32) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn modulus(&self) -> BigUint {
        BigUint::one() << self.bits
    }

    fn half(&self) -> BigUint {
        BigUint::one() << self.bits.saturating_sub(1)
    }

    /// Reduce any integer into `[0, 2^k)`.
    pub fn reduce(&self, value: &BigInt) -> BigUint {
        let m = BigInt::from_biguint(Sign::Plus, self.modulus());
        // mod_floor is non-negative for a positive modulus
        value.mod_floor(&m).magnitude().clone()
    }

    /// Encode a signed integer, rejecting values outside `[-2^(k-1), 2^(k-1))`.
    pub fn encode_signed(&self, value: &BigInt) -> EvalResult<BigUint> {
        let half = BigInt::from_biguint(Sign::Plus, self.half());
        if *value >= half || *value < -half {
            return Err(EvalError::OutOfRange {
                what: "signed plaintext",
                bits: self.bits,
            });
        }
        Ok(self.reduce(value))
    }

    /// Interpret a residue as a signed integer.
    pub fn decode_signed(&self, value: &BigUint) -> BigInt {
        let m = self.modulus();
        let v = value % &m;
        if v >= self.half() {
            BigInt::from_biguint(Sign::Plus, v) - BigInt::from_biguint(Sign::Plus, m)
        } else {
            BigInt::from_biguint(Sign::Plus, v)
        }
    }

    /// Fixed-point encode `value * scale`.
    pub fn encode_fixed(&self, value: f64, scale: f64) -> EvalResult<BigUint> {
        let scaled = value * scale;
        if !scaled.is_finite() {
            return Err(EvalError::NonFinite {
                what: "scaled plaintext",
                value: scaled,
            });
        }
        let int = BigInt::from_f64(scaled.trunc()).ok_or(EvalError::NonFinite {
            what: "scaled plaintext",
            value: scaled,
        })?;
        self.encode_signed(&int)
    }

    /// Inverse of [`encode_fixed`](Self::encode_fixed), up to truncation.
    pub fn decode_fixed(&self, value: &BigUint, scale: f64) -> f64 {
        self.decode_signed(value).to_f64().unwrap_or(f64::NAN) / scale
    }
}
