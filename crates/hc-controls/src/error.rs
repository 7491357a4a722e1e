//! Error types for encrypted control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
///
/// The control laws themselves cannot fail; everything here is either a
/// misuse of the generic [`ControlLaw`](crate::ControlLaw) entry point or a
/// backend failure passed through unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Controller state error.
    #[error("Controller state error: {what}")]
    StateError { what: String },

    /// Homomorphic backend failure.
    #[error("Backend error: {0}")]
    Backend(#[from] hc_core::EvalError),
}
