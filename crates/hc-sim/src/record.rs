//! Recorded loop trajectory.

use serde::{Deserialize, Serialize};

/// One control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSample {
    pub step: usize,
    /// Nominal time at the start of the cycle (seconds).
    pub time: f64,
    pub setpoint: f64,
    /// Plant state the error was computed from.
    pub state: f64,
    pub error: f64,
    /// Decrypted control output, rescaled.
    pub output: f64,
    /// Same control law evaluated on the plaintexts, rescaled.
    pub reference_output: f64,
    /// Plant state after applying `output`.
    pub next_state: f64,
    /// Whether the decrypted output equals the plaintext evaluation exactly.
    pub exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopRecord {
    pub samples: Vec<LoopSample>,
}

impl LoopRecord {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when every decrypted output matched its plaintext evaluation.
    pub fn all_exact(&self) -> bool {
        self.samples.iter().all(|s| s.exact)
    }

    pub fn final_state(&self) -> Option<f64> {
        self.samples.last().map(|s| s.next_state)
    }
}
