use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Value not invertible modulo N: {what}")]
    NotInvertible { what: &'static str },

    #[error("Plaintext out of range for {bits}-bit message space: {what}")]
    OutOfRange { what: &'static str, bits: u32 },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
