//! Error types for the labeled HE backend.

use thiserror::Error;

pub type LheResult<T> = Result<T, LheError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LheError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Key generation failed: {what}")]
    KeyGen { what: &'static str },

    #[error("Label {label} was already used for an encryption")]
    LabelReused { label: u64 },

    #[error("Evaluation error: {0}")]
    Eval(#[from] hc_core::EvalError),
}
