//! Training Configuration
//!
//! Hyperparameters for driver programs. The core layers don't read these —
//! they take `batch_size` and `learning_rate` as plain arguments — but
//! every driver needs the same handful of knobs, and serializing them
//! keeps experiment settings alongside their results.
//!
//! ## Example
//!
//! ```rust
//! use cesario::TrainingConfig;
//!
//! let config = TrainingConfig {
//!     learning_rate: 1.0,
//!     num_epochs: 5000,
//!     batch_size: 1,
//!     print_every: 500,
//! };
//!
//! let json = config.to_json().unwrap();
//! let restored = TrainingConfig::from_json(&json).unwrap();
//! assert_eq!(restored.num_epochs, 5000);
//! ```

use serde::{Deserialize, Serialize};

/// Hyperparameters for a training run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Step size for SGD updates
    pub learning_rate: f64,
    /// Number of passes through the dataset
    pub num_epochs: usize,
    /// Examples per minibatch (gradients accumulate across the batch)
    pub batch_size: usize,
    /// Print metrics every N epochs
    pub print_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            num_epochs: 100,
            batch_size: 1,
            print_every: 10,
        }
    }
}

impl TrainingConfig {
    /// Preset matching the XOR regression setup
    ///
    /// Plain per-sample SGD at a high learning rate; tiny nets on four
    /// examples tolerate (and need) aggressive steps.
    pub fn xor() -> Self {
        Self {
            learning_rate: 1.0,
            num_epochs: 5000,
            batch_size: 1,
            print_every: 500,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let config = TrainingConfig::xor();
        let json = config.to_json().unwrap();
        let restored = TrainingConfig::from_json(&json).unwrap();

        assert_eq!(restored.learning_rate, config.learning_rate);
        assert_eq!(restored.num_epochs, config.num_epochs);
        assert_eq!(restored.batch_size, config.batch_size);
        assert_eq!(restored.print_every, config.print_every);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(TrainingConfig::from_json("{\"learning_rate\": ").is_err());
    }
}
