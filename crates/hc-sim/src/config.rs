//! Loop configuration.
//!
//! Every section has defaults, so a YAML file only needs the fields it
//! changes. The defaults reproduce the reference PID demo: gains 10 / 8 / 0.1
//! scaled so that every term of the output carries a 10^8 scale.

use crate::error::{SimError, SimResult};
use hc_controls::ControllerKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Headroom the key generator needs above the message size, per prime.
const PRIME_MARGIN_BITS: u64 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub kind: ControllerKind,
    pub gains: GainConfig,
    pub scaling: ScalingConfig,
    pub crypto: CryptoConfig,
    pub setpoint: SetpointConfig,
    pub plant: PlantConfig,
    /// Nominal sample period (seconds).
    pub sample_period: f64,
    /// Number of control cycles.
    pub steps: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            kind: ControllerKind::PID,
            gains: GainConfig::default(),
            scaling: ScalingConfig::default(),
            crypto: CryptoConfig::default(),
            setpoint: SetpointConfig::default(),
            plant: PlantConfig::default(),
            sample_period: 0.1,
            steps: 1000,
        }
    }
}

/// Real-valued controller gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            kp: 10.0,
            ki: 8.0,
            kd: 0.1,
        }
    }
}

/// Fixed-point scales.
///
/// `Ki` and `Kd` are encoded as `gain · gain / time`, so the integral and
/// derivative terms end up with the same `gain · error` scale as the
/// proportional one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub gain: f64,
    pub error: f64,
    pub time: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            gain: 1000.0,
            error: 100_000.0,
            time: 100.0,
        }
    }
}

impl ScalingConfig {
    /// Scale carried by the decrypted control output.
    pub fn output(&self) -> f64 {
        self.gain * self.error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Bit size of the public modulus `N`.
    pub key_bits: u64,
    /// Bit size of the plaintext space.
    pub msg_bits: u32,
    /// Seed for keys, labels and rerandomization. Random when absent.
    pub seed: Option<u64>,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key_bits: 2048,
            msg_bits: 64,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetpointConfig {
    pub value: f64,
    /// Negate the setpoint every this many samples.
    pub flip_every: Option<usize>,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            value: 10.0,
            flip_every: Some(250),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub pole: f64,
    pub input_gain: f64,
    pub initial_state: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            pole: 0.9,
            input_gain: 0.1,
            initial_state: 0.0,
        }
    }
}

impl LoopConfig {
    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.sample_period.is_finite() && self.sample_period > 0.0) {
            return Err(SimError::InvalidArg {
                what: "sample_period must be positive",
            });
        }
        if self.steps == 0 {
            return Err(SimError::InvalidArg {
                what: "steps must be positive",
            });
        }
        let s = &self.scaling;
        if [s.gain, s.error, s.time]
            .iter()
            .any(|v| !(v.is_finite() && *v > 0.0))
        {
            return Err(SimError::InvalidArg {
                what: "scaling factors must be positive",
            });
        }
        let g = &self.gains;
        if ![g.kp, g.ki, g.kd].iter().all(|v| v.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "gains must be finite",
            });
        }
        if self.crypto.msg_bits < 2 || self.crypto.msg_bits > 512 {
            return Err(SimError::InvalidArg {
                what: "msg_bits must be between 2 and 512",
            });
        }
        if self.crypto.key_bits / 2 <= u64::from(self.crypto.msg_bits) + PRIME_MARGIN_BITS {
            return Err(SimError::InvalidArg {
                what: "key_bits too small for msg_bits",
            });
        }
        if self.setpoint.flip_every == Some(0) {
            return Err(SimError::InvalidArg {
                what: "setpoint.flip_every must be positive",
            });
        }
        if !self.setpoint.value.is_finite() {
            return Err(SimError::InvalidArg {
                what: "setpoint must be finite",
            });
        }
        Ok(())
    }
}
