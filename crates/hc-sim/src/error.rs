//! Error types for closed-loop runs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<hc_controls::ControlError> for SimError {
    fn from(e: hc_controls::ControlError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<hc_lhe::LheError> for SimError {
    fn from(e: hc_lhe::LheError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<hc_core::EvalError> for SimError {
    fn from(e: hc_core::EvalError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
