//! Reference labeled homomorphic encryption backend.
//!
//! Provides:
//! - Joye–Libert additively homomorphic encryption (keygen, encrypt, decrypt)
//! - label-keyed one-time masks and `(a, beta)` level-1 ciphertexts
//! - [`LabeledEvaluator`], the [`hc_core::HomomorphicEval`] implementation
//!   with two- and three-operand multiplication
//! - [`LabeledClient`], the key holder's side: fresh labels, cross terms and
//!   decryption with the mask offset of an evaluated expression

pub mod client;
pub mod error;
pub mod joye_libert;
pub mod labeled;

mod arith;

pub use client::{Encrypted, LabeledClient};
pub use error::{LheError, LheResult};
pub use joye_libert::{KeyPair, PublicKey, SecretKey};
pub use labeled::{LabeledEvaluator, MaskKey};
