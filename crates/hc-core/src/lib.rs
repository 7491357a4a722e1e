//! hc-core: shared model for encrypted control.
//!
//! Contains:
//! - ciphertext (level-1 `(a, beta)` pairs, level-2 products, cross terms)
//! - params (public evaluation parameters N, y and message size)
//! - plaintext (signed and fixed-point mapping into Z_{2^k})
//! - eval (the homomorphic backend contract the controllers call through)
//! - error (shared error types)

pub mod ciphertext;
pub mod error;
pub mod eval;
pub mod params;
pub mod plaintext;

pub use ciphertext::{Ciphertext, CrossTerm, ProductCiphertext, TripleCrossTerms};
pub use error::{EvalError, EvalResult};
pub use eval::HomomorphicEval;
pub use params::EvalParams;
pub use plaintext::PlaintextSpace;
