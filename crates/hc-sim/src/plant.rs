//! Plant dynamics driven by the decrypted control output.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Discrete first-order plant: `x ← pole·x + input_gain·u`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderPlant {
    /// Pole of the discrete dynamics, must satisfy `|pole| < 1`.
    pub pole: f64,
    /// Gain applied to the control input.
    pub input_gain: f64,
    /// Current state.
    pub state: f64,
}

impl FirstOrderPlant {
    /// Create a new plant.
    ///
    /// # Errors
    ///
    /// Returns error if the plant is unstable or any value is non-finite.
    pub fn new(pole: f64, input_gain: f64, initial_state: f64) -> SimResult<Self> {
        if !(pole.is_finite() && input_gain.is_finite() && initial_state.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "plant parameters must be finite",
            });
        }
        if pole.abs() >= 1.0 {
            return Err(SimError::InvalidArg {
                what: "plant pole must lie inside the unit circle",
            });
        }
        Ok(Self {
            pole,
            input_gain,
            state: initial_state,
        })
    }

    /// Apply one sample of input `u` and return the new state.
    pub fn step(&mut self, u: f64) -> f64 {
        self.state = self.pole * self.state + self.input_gain * u;
        self.state
    }
}
