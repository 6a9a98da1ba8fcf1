//! Dropout Layer (Inverted)
//!
//! Randomly zeroes activations during training to prevent co-adaptation,
//! scaling the survivors by `1/keep_prob` so the expected activation is
//! unchanged — which is what lets inference skip rescaling entirely.
//!
//! ## Modes
//!
//! The layer holds an explicit mode so its chain-facing `forward` signature
//! stays uniform:
//!
//! - **Train**: a fresh Bernoulli(keep_prob) mask is sampled per element
//!   and the kept entries are scaled by `1/keep_prob`.
//! - **Test**: the input passes through exactly, and the mask is cleared.
//!
//! Calling `backward` after a test-mode forward is a contract violation
//! and panics: there is no mask that corresponds to the pass being
//! differentiated, and silently reusing an old one would route gradients
//! through the wrong elements.

use crate::rng::RandomGenerator;
use crate::tensor::Tensor;

/// Whether a dropout layer is training (masking) or evaluating (identity)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropoutMode {
    Train,
    Test,
}

/// Inverted dropout with an owned sample stream
///
/// Each instance owns its [`RandomGenerator`]; seed it for reproducible
/// masks.
pub struct Dropout {
    keep_prob: f64,
    mode: DropoutMode,
    rng: RandomGenerator,

    // Mask from the last train-mode forward; None after a test-mode pass.
    mask: Option<Tensor>,
    output: Tensor,
    grad_input: Tensor,
}

impl Dropout {
    /// Create a dropout layer in train mode
    ///
    /// # Arguments
    ///
    /// * `keep_prob` - Probability an element survives, in (0, 1]
    /// * `rng` - Generator the layer will own for mask sampling
    ///
    /// # Panics
    ///
    /// Panics if `keep_prob` is outside (0, 1].
    pub fn new(keep_prob: f64, rng: RandomGenerator) -> Self {
        assert!(
            keep_prob > 0.0 && keep_prob <= 1.0,
            "Dropout keep probability must be in (0, 1], got {}",
            keep_prob
        );
        Self {
            keep_prob,
            mode: DropoutMode::Train,
            rng,
            mask: None,
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
        }
    }

    /// Switch between train and test behavior
    pub fn set_mode(&mut self, mode: DropoutMode) {
        self.mode = mode;
    }

    /// Current mode
    pub fn mode(&self) -> DropoutMode {
        self.mode
    }

    /// Forward pass
    ///
    /// Train mode samples a fresh mask (sequentially — the mask draws come
    /// from one stream); test mode is the identity and clears the mask.
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        match self.mode {
            DropoutMode::Train => {
                let scale = 1.0 / self.keep_prob;
                let mask_data: Vec<f64> = (0..input.len())
                    .map(|_| {
                        if self.rng.std_uniform() <= self.keep_prob {
                            scale
                        } else {
                            0.0
                        }
                    })
                    .collect();
                let mask = Tensor::new(mask_data, input.shape.clone());
                let output = input.hadamard(&mask);
                self.mask = Some(mask);
                self.output = output.clone();
                output
            }
            DropoutMode::Test => {
                self.mask = None;
                self.output = input.clone();
                input.clone()
            }
        }
    }

    /// Backward pass: the surviving elements pass their gradient, scaled
    /// exactly as the forward pass scaled them
    ///
    /// # Panics
    ///
    /// Panics if the last forward ran in test mode (no mask to apply), or
    /// if the upstream gradient's shape disagrees with the last output.
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match dropout output shape {:?}",
            upstream.shape, self.output.shape
        );
        let mask = self
            .mask
            .as_ref()
            .unwrap_or_else(|| panic!("Dropout backward after a test-mode forward"));
        self.grad_input = upstream.hadamard(mask);
    }

    /// Gradient w.r.t. the last forward input
    pub fn gradient_wrt_input(&self) -> &Tensor {
        &self.grad_input
    }

    /// Keep probability this layer was configured with
    pub fn keep_prob(&self) -> f64 {
        self.keep_prob
    }
}
