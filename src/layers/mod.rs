//! Neural Network Layers
//!
//! This module contains every layer primitive in the engine. Each layer
//! provides a manual forward pass and a matching hand-derived backward
//! pass.
//!
//! ## Layers
//!
//! - **dense**: fully connected affine transform (trainable)
//! - **conv2d**: valid 2D convolution over cubes (trainable)
//! - **max_pooling**: per-slice window maximum with argmax gradient routing
//! - **dropout**: inverted dropout with explicit train/test modes
//! - **relu**, **sigmoid**, **softmax**: activations
//!
//! ## Design Pattern
//!
//! Every layer follows the same contract:
//!
//! ```rust,ignore
//! impl SomeLayer {
//!     pub fn forward(&mut self, input: &Tensor) -> Tensor { }
//!     pub fn backward(&mut self, upstream: &Tensor) { }
//!     pub fn gradient_wrt_input(&self) -> &Tensor { }
//!     // trainable layers additionally:
//!     pub fn update_parameters(&mut self, batch_size: usize, lr: f64) { }
//! }
//! ```
//!
//! Forward caches whatever backward will need; backward stores the
//! gradient w.r.t. the input for the previous layer to pick up. Caches are
//! single-slot: a second forward overwrites the state a pending backward
//! depends on, so exactly one example may be in flight per layer instance —
//! never pipeline two examples through the same instance concurrently.
//!
//! The [`Layer`] enum wraps the concrete types behind one uniform surface
//! so a driver can hold an ordered `Vec<Layer>` and iterate generically.

pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod max_pooling;
pub mod relu;
pub mod sigmoid;
pub mod softmax;

// Re-export main types for convenience
pub use conv2d::Conv2D;
pub use dense::Dense;
pub use dropout::{Dropout, DropoutMode};
pub use max_pooling::MaxPooling;
pub use relu::ReLU;
pub use sigmoid::Sigmoid;
pub use softmax::Softmax;

use crate::tensor::Tensor;

/// Tagged union over the supported layer kinds
///
/// A network is an ordered sequence of these; dispatch is a plain `match`,
/// keeping the fixed operator set explicit (there is no autodiff tape —
/// each variant carries its own hand-derived backward pass).
pub enum Layer {
    Dense(Dense),
    Conv2D(Conv2D),
    MaxPooling(MaxPooling),
    Dropout(Dropout),
    ReLU(ReLU),
    Sigmoid(Sigmoid),
    Softmax(Softmax),
}

impl Layer {
    /// Forward pass through whichever layer this is
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        match self {
            Layer::Dense(l) => l.forward(input),
            Layer::Conv2D(l) => l.forward(input),
            Layer::MaxPooling(l) => l.forward(input),
            Layer::Dropout(l) => l.forward(input),
            Layer::ReLU(l) => l.forward(input),
            Layer::Sigmoid(l) => l.forward(input),
            Layer::Softmax(l) => l.forward(input),
        }
    }

    /// Backward pass; the result is retrievable via [`gradient_wrt_input`](Self::gradient_wrt_input)
    pub fn backward(&mut self, upstream: &Tensor) {
        match self {
            Layer::Dense(l) => l.backward(upstream),
            Layer::Conv2D(l) => l.backward(upstream),
            Layer::MaxPooling(l) => l.backward(upstream),
            Layer::Dropout(l) => l.backward(upstream),
            Layer::ReLU(l) => l.backward(upstream),
            Layer::Sigmoid(l) => l.backward(upstream),
            Layer::Softmax(l) => l.backward(upstream),
        }
    }

    /// Gradient w.r.t. this layer's last forward input
    pub fn gradient_wrt_input(&self) -> &Tensor {
        match self {
            Layer::Dense(l) => l.gradient_wrt_input(),
            Layer::Conv2D(l) => l.gradient_wrt_input(),
            Layer::MaxPooling(l) => l.gradient_wrt_input(),
            Layer::Dropout(l) => l.gradient_wrt_input(),
            Layer::ReLU(l) => l.gradient_wrt_input(),
            Layer::Sigmoid(l) => l.gradient_wrt_input(),
            Layer::Softmax(l) => l.gradient_wrt_input(),
        }
    }

    /// Apply the accumulated minibatch step
    ///
    /// A no-op for layers without trainable parameters, so a driver can
    /// blindly call it across the whole chain once per minibatch.
    pub fn update_parameters(&mut self, batch_size: usize, learning_rate: f64) {
        match self {
            Layer::Dense(l) => l.update_parameters(batch_size, learning_rate),
            Layer::Conv2D(l) => l.update_parameters(batch_size, learning_rate),
            Layer::MaxPooling(_)
            | Layer::Dropout(_)
            | Layer::ReLU(_)
            | Layer::Sigmoid(_)
            | Layer::Softmax(_) => {}
        }
    }

    /// Switch dropout mode; no-op for every other layer kind
    pub fn set_dropout_mode(&mut self, mode: DropoutMode) {
        if let Layer::Dropout(l) = self {
            l.set_mode(mode);
        }
    }
}
