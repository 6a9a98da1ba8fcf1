//! Loss Functions
//!
//! A loss turns the network's final output and the example's label into a
//! scalar, and on the backward pass produces the gradient of that scalar
//! with respect to the prediction — the seed for backpropagation through
//! the layer chain.
//!
//! ## Contract
//!
//! - `forward(predicted, actual) -> f64` caches both vectors.
//! - `backward()` differentiates against the cached pair.
//! - `gradient_wrt_predicted()` hands the result to the last layer's
//!   backward pass.
//!
//! Losses hold no trainable parameters; like layers, their caches are
//! single-slot (one in-flight example at a time).

pub mod cross_entropy;
pub mod mse;

pub use cross_entropy::CrossEntropyLoss;
pub use mse::MSELoss;

use crate::tensor::Tensor;

/// Tagged union over the supported loss kinds
///
/// Lets a [`Network`](crate::network::Network) hold "some loss" without a
/// trait object, mirroring the [`Layer`](crate::layers::Layer) enum.
pub enum Loss {
    CrossEntropy(CrossEntropyLoss),
    Mse(MSELoss),
}

impl Loss {
    /// Compute the scalar loss, caching prediction and label
    pub fn forward(&mut self, predicted: &Tensor, actual: &Tensor) -> f64 {
        match self {
            Loss::CrossEntropy(l) => l.forward(predicted, actual),
            Loss::Mse(l) => l.forward(predicted, actual),
        }
    }

    /// Compute the gradient w.r.t. the cached prediction
    pub fn backward(&mut self) {
        match self {
            Loss::CrossEntropy(l) => l.backward(),
            Loss::Mse(l) => l.backward(),
        }
    }

    /// Gradient w.r.t. the prediction from the last backward
    pub fn gradient_wrt_predicted(&self) -> &Tensor {
        match self {
            Loss::CrossEntropy(l) => l.gradient_wrt_predicted(),
            Loss::Mse(l) => l.gradient_wrt_predicted(),
        }
    }

    /// Loss value from the last forward
    pub fn loss(&self) -> f64 {
        match self {
            Loss::CrossEntropy(l) => l.loss(),
            Loss::Mse(l) => l.loss(),
        }
    }
}
