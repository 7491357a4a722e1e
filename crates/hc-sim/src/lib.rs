//! Closed-loop driver for encrypted controllers.
//!
//! Provides:
//! - YAML loop configuration with defaults matching the reference PID demo
//! - First-order plant model
//! - Per-cycle encrypt → iterate → decrypt pipeline for P, PI and PID
//! - A plaintext shadow of the control law to check every decrypted output

pub mod config;
pub mod error;
pub mod plant;
pub mod record;
pub mod session;

pub use config::{CryptoConfig, GainConfig, LoopConfig, PlantConfig, ScalingConfig, SetpointConfig};
pub use error::{SimError, SimResult};
pub use plant::FirstOrderPlant;
pub use record::{LoopRecord, LoopSample};
pub use session::{EncryptedLoop, run_loop};
