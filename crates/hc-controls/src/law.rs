//! One entry point over the three controller types.
//!
//! Drivers that pick the control law at runtime hold a [`ControlLaw`] and
//! feed it a [`ControlInput`]; each variant still runs its own `iterate`.

use crate::controller::{PController, PIController, PIDController};
use crate::error::{ControlError, ControlResult};
use crate::state::IntegralState;
use crate::terms::{DerivativeTerms, IntegralTerms};
use hc_core::{Ciphertext, EvalParams, HomomorphicEval, ProductCiphertext};
use serde::{Deserialize, Serialize};

/// Which terms a controller evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    P,
    PI,
    PID,
}

impl ControllerKind {
    pub fn has_integral(self) -> bool {
        matches!(self, Self::PI | Self::PID)
    }

    pub fn has_derivative(self) -> bool {
        matches!(self, Self::PID)
    }
}

impl core::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::P => "P",
            Self::PI => "PI",
            Self::PID => "PID",
        })
    }
}

impl core::str::FromStr for ControllerKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p" => Ok(Self::P),
            "pi" => Ok(Self::PI),
            "pid" => Ok(Self::PID),
            _ => Err(ControlError::InvalidArg {
                what: "controller kind must be one of p, pi, pid",
            }),
        }
    }
}

/// Encrypted gains. `ki` and `kd` are required by the kinds that use them.
#[derive(Debug, Clone)]
pub struct EncryptedGains {
    pub kp: Ciphertext,
    pub ki: Option<Ciphertext>,
    pub kd: Option<Ciphertext>,
}

/// Inputs for one control cycle.
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    pub error: &'a Ciphertext,
    pub integral: Option<IntegralTerms<'a>>,
    pub derivative: Option<DerivativeTerms<'a>>,
}

#[derive(Debug, Clone)]
pub enum ControlLaw<E> {
    P(PController<E>),
    PI(PIController<E>),
    PID(PIDController<E>),
}

impl<E: HomomorphicEval> ControlLaw<E> {
    /// Build a controller of `kind`.
    ///
    /// # Errors
    ///
    /// `InvalidArg` when a gain the kind needs is missing.
    pub fn new(
        kind: ControllerKind,
        eval: E,
        gains: EncryptedGains,
        params: EvalParams,
    ) -> ControlResult<Self> {
        let EncryptedGains { kp, ki, kd } = gains;
        let require = |gain: Option<Ciphertext>, what| gain.ok_or(ControlError::InvalidArg { what });
        Ok(match kind {
            ControllerKind::P => Self::P(PController::new(eval, kp, params)),
            ControllerKind::PI => Self::PI(PIController::new(
                eval,
                kp,
                require(ki, "PI controller requires ki")?,
                params,
            )),
            ControllerKind::PID => Self::PID(PIDController::new(
                eval,
                kp,
                require(ki, "PID controller requires ki")?,
                require(kd, "PID controller requires kd")?,
                params,
            )),
        })
    }

    /// Use reproducible randomness for product rerandomization.
    pub fn with_seed(self, seed: u64) -> Self {
        match self {
            Self::P(c) => Self::P(c.with_seed(seed)),
            Self::PI(c) => Self::PI(c.with_seed(seed)),
            Self::PID(c) => Self::PID(c.with_seed(seed)),
        }
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Self::P(_) => ControllerKind::P,
            Self::PI(_) => ControllerKind::PI,
            Self::PID(_) => ControllerKind::PID,
        }
    }

    pub fn params(&self) -> &EvalParams {
        match self {
            Self::P(c) => c.params(),
            Self::PI(c) => c.params(),
            Self::PID(c) => c.params(),
        }
    }

    fn proportional_mut(&mut self) -> &mut PController<E> {
        match self {
            Self::P(c) => c,
            Self::PI(c) => c.proportional_mut(),
            Self::PID(c) => c.pi_mut().proportional_mut(),
        }
    }

    pub fn params_mut(&mut self) -> &mut EvalParams {
        self.proportional_mut().params_mut()
    }

    pub fn set_params(&mut self, params: EvalParams) {
        self.proportional_mut().set_params(params);
    }

    /// Replace the proportional gain; takes effect on the next `iterate`.
    pub fn set_kp(&mut self, kp: Ciphertext) {
        self.proportional_mut().set_kp(kp);
    }

    /// Replace the integral gain. `InvalidArg` for a P controller.
    pub fn set_ki(&mut self, ki: Ciphertext) -> ControlResult<()> {
        match self {
            Self::P(_) => Err(ControlError::InvalidArg {
                what: "P controller has no ki",
            }),
            Self::PI(c) => {
                c.set_ki(ki);
                Ok(())
            }
            Self::PID(c) => {
                c.pi_mut().set_ki(ki);
                Ok(())
            }
        }
    }

    /// Replace the derivative gain. `InvalidArg` unless this is a PID.
    pub fn set_kd(&mut self, kd: Ciphertext) -> ControlResult<()> {
        match self {
            Self::PID(c) => {
                c.set_kd(kd);
                Ok(())
            }
            _ => Err(ControlError::InvalidArg {
                what: "only a PID controller has kd",
            }),
        }
    }

    /// Integral state; always unseeded for a P controller.
    pub fn integral_state(&self) -> &IntegralState {
        static UNSEEDED: IntegralState = IntegralState::Unseeded;
        match self {
            Self::P(_) => &UNSEEDED,
            Self::PI(c) => c.integral_state(),
            Self::PID(c) => c.integral_state(),
        }
    }

    pub fn previous_error(&self) -> Option<&Ciphertext> {
        match self {
            Self::PID(c) => c.previous_error(),
            _ => None,
        }
    }

    /// Run one control cycle.
    ///
    /// Terms a kind does not use are ignored; missing terms it needs are an
    /// `InvalidArg` error and leave the controller unchanged.
    pub fn iterate(&mut self, input: &ControlInput<'_>) -> ControlResult<ProductCiphertext> {
        match self {
            Self::P(c) => c.iterate(input.error),
            Self::PI(c) => {
                let integral = input.integral.as_ref().ok_or(ControlError::InvalidArg {
                    what: "PI controller requires integral terms",
                })?;
                c.iterate(input.error, integral)
            }
            Self::PID(c) => {
                let integral = input.integral.as_ref().ok_or(ControlError::InvalidArg {
                    what: "PID controller requires integral terms",
                })?;
                let derivative = input.derivative.as_ref().ok_or(ControlError::InvalidArg {
                    what: "PID controller requires derivative terms",
                })?;
                c.iterate(input.error, integral, derivative)
            }
        }
    }
}
