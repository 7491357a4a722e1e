//! Public evaluation parameters shared across a control session.

use crate::error::{EvalError, EvalResult};
use crate::plaintext::PlaintextSpace;
use num_bigint::BigUint;
use num_traits::One;

/// Public modulus `N`, randomization base `y` and message size in bits.
///
/// Every multiplicative operation needs all three; addition only needs `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalParams {
    modulus: BigUint,
    y: BigUint,
    msg_bits: u32,
}

impl EvalParams {
    /// Create a validated parameter set.
    ///
    /// # Arguments
    ///
    /// * `modulus` - Public modulus `N` (must be greater than 1)
    /// * `y` - Randomization base (must satisfy `1 < y < N`)
    /// * `msg_bits` - Bit width of the plaintext space (must be positive)
    pub fn new(modulus: BigUint, y: BigUint, msg_bits: u32) -> EvalResult<Self> {
        check_modulus(&modulus)?;
        check_y(&y, &modulus)?;
        check_msg_bits(msg_bits)?;
        Ok(Self {
            modulus,
            y,
            msg_bits,
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }

    pub fn msg_bits(&self) -> u32 {
        self.msg_bits
    }

    /// `2^msg_bits`, the size of the plaintext space.
    pub fn plaintext_modulus(&self) -> BigUint {
        BigUint::one() << self.msg_bits
    }

    pub fn plaintext_space(&self) -> PlaintextSpace {
        PlaintextSpace::new(self.msg_bits)
    }

    pub fn set_modulus(&mut self, modulus: BigUint) -> EvalResult<()> {
        check_modulus(&modulus)?;
        check_y(&self.y, &modulus)?;
        self.modulus = modulus;
        Ok(())
    }

    pub fn set_y(&mut self, y: BigUint) -> EvalResult<()> {
        check_y(&y, &self.modulus)?;
        self.y = y;
        Ok(())
    }

    pub fn set_msg_bits(&mut self, msg_bits: u32) -> EvalResult<()> {
        check_msg_bits(msg_bits)?;
        self.msg_bits = msg_bits;
        Ok(())
    }
}

fn check_modulus(modulus: &BigUint) -> EvalResult<()> {
    if *modulus <= BigUint::one() {
        return Err(EvalError::InvalidArg {
            what: "modulus must be greater than 1",
        });
    }
    Ok(())
}

fn check_y(y: &BigUint, modulus: &BigUint) -> EvalResult<()> {
    if *y <= BigUint::one() || y >= modulus {
        return Err(EvalError::InvalidArg {
            what: "y must lie strictly between 1 and the modulus",
        });
    }
    Ok(())
}

fn check_msg_bits(msg_bits: u32) -> EvalResult<()> {
    if msg_bits == 0 {
        return Err(EvalError::InvalidArg {
            what: "msg_bits must be positive",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EvalParams {
        EvalParams::new(BigUint::from(3233u32), BigUint::from(7u32), 8).unwrap()
    }

    #[test]
    fn plaintext_modulus_is_power_of_two() {
        assert_eq!(params().plaintext_modulus(), BigUint::from(256u32));
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(EvalParams::new(BigUint::one(), BigUint::from(7u32), 8).is_err());
        assert!(EvalParams::new(BigUint::from(3233u32), BigUint::from(3233u32), 8).is_err());
        assert!(EvalParams::new(BigUint::from(3233u32), BigUint::from(7u32), 0).is_err());
    }

    #[test]
    fn setters_validate_and_keep_previous_on_error() {
        let mut p = params();
        assert!(p.set_y(BigUint::one()).is_err());
        assert_eq!(p.y(), &BigUint::from(7u32));

        // Shrinking N below y would leave y out of range.
        assert!(p.set_modulus(BigUint::from(5u32)).is_err());
        assert_eq!(p.modulus(), &BigUint::from(3233u32));

        p.set_msg_bits(16).unwrap();
        assert_eq!(p.msg_bits(), 16);
    }
}
