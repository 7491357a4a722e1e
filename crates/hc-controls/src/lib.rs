//! Encrypted P, PI and PID control laws.
//!
//! Controllers evaluate their control output entirely on ciphertexts through
//! a [`hc_core::HomomorphicEval`] backend and never see plaintext errors,
//! gains or timestamps.
//!
//! # Architecture
//!
//! - [`EvalContext`] bundles the backend, the public parameters and the
//!   per-controller randomness used to rerandomize products
//! - [`IntegralState`] is the UNSEEDED/SEEDED state machine shared by PI and
//!   PID: the first sample seeds the accumulator, later samples add to it
//! - [`PIController`] wraps a [`PController`] for its proportional part and
//!   [`PIDController`] wraps a [`PIController`], reusing its seeded flag
//!   to suppress the derivative term on the first sample
//! - [`ControlLaw`] wraps any of the three behind one `iterate`
//!
//! Controllers take `&mut self` to iterate, so overlapping
//! calls on one instance are ruled out by the borrow checker. Independent
//! instances share nothing.

pub mod context;
pub mod controller;
pub mod error;
pub mod law;
pub mod state;
pub mod terms;

#[cfg(test)]
mod testing;

pub use context::EvalContext;
pub use controller::{PController, PIController, PIDController};
pub use error::{ControlError, ControlResult};
pub use law::{ControlInput, ControlLaw, ControllerKind, EncryptedGains};
pub use state::IntegralState;
pub use terms::{DerivativeTerms, IntegralTerms};
