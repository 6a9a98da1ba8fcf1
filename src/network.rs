//! Layer Chain Composition
//!
//! A [`Network`] is an ordered sequence of [`Layer`]s plus exactly one
//! [`Loss`]. It owns the wiring a training driver would otherwise repeat by
//! hand:
//!
//! ```text
//! input → layer₁.forward → … → layerₙ.forward → loss.forward(out, label)
//!         loss.backward → layerₙ.backward → … → layer₁.backward
//!         update_parameters(batch_size, lr) once per minibatch
//! ```
//!
//! The epoch/minibatch loop itself stays with the caller: the network only
//! guarantees that one `train_sample` call runs one complete
//! forward/loss/backward cycle, and that `update_parameters` applies and
//! clears whatever the cycles since the last update accumulated.
//!
//! ## In-Flight Contract
//!
//! Layers cache single-slot state, so a network instance processes one
//! example at a time. Never interleave `update_parameters` with an
//! unfinished forward/backward pair, and never share an instance across
//! threads mid-sample.
//!
//! ## Example
//!
//! ```rust
//! use cesario::{Dense, Layer, Loss, MSELoss, Network, RandomGenerator, Sigmoid, Tensor};
//!
//! let mut rng = RandomGenerator::from_seed(42);
//! let mut net = Network::new(
//!     vec![
//!         Layer::Dense(Dense::new(2, 4, "xavier", &mut rng)),
//!         Layer::Sigmoid(Sigmoid::new(4)),
//!         Layer::Dense(Dense::new(4, 1, "xavier", &mut rng)),
//!         Layer::Sigmoid(Sigmoid::new(1)),
//!     ],
//!     Loss::Mse(MSELoss::new()),
//! );
//!
//! let x = Tensor::vector(vec![0.0, 1.0]);
//! let label = Tensor::vector(vec![1.0]);
//! let loss = net.train_sample(&x, &label);
//! net.update_parameters(1, 0.5);
//! assert!(loss.is_finite());
//! ```

use crate::layers::{DropoutMode, Layer};
use crate::losses::Loss;
use crate::tensor::Tensor;

/// Ordered layer chain with one loss at the end
pub struct Network {
    /// The layer sequence, first layer first
    pub layers: Vec<Layer>,
    /// The loss fed by the last layer's output
    pub loss: Loss,
}

impl Network {
    /// Assemble a network
    ///
    /// Shape compatibility between consecutive layers is the caller's
    /// architecture decision; mismatches surface as loud per-layer shape
    /// panics on the first forward pass.
    ///
    /// # Panics
    ///
    /// Panics on an empty layer list.
    pub fn new(layers: Vec<Layer>, loss: Loss) -> Self {
        assert!(!layers.is_empty(), "Network needs at least one layer");
        Self { layers, loss }
    }

    /// Run the forward chain and return the final layer's output
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Differentiate the most recent forward/loss pair back to the first layer
    ///
    /// Seeds the chain with the loss gradient, then walks the layers in
    /// reverse, handing each layer the gradient w.r.t. its output.
    pub fn backward(&mut self) {
        self.loss.backward();
        let mut upstream = self.loss.gradient_wrt_predicted().clone();
        for layer in self.layers.iter_mut().rev() {
            layer.backward(&upstream);
            upstream = layer.gradient_wrt_input().clone();
        }
    }

    /// One complete training cycle for one example
    ///
    /// Forward chain, loss, and backward chain; gradients accumulate in
    /// every trainable layer. Returns the example's loss.
    pub fn train_sample(&mut self, input: &Tensor, label: &Tensor) -> f64 {
        let prediction = self.forward(input);
        let loss = self.loss.forward(&prediction, label);
        self.backward();
        loss
    }

    /// Apply the accumulated minibatch step to every trainable layer
    ///
    /// Call exactly once per minibatch, after its last backward pass.
    pub fn update_parameters(&mut self, batch_size: usize, learning_rate: f64) {
        for layer in &mut self.layers {
            layer.update_parameters(batch_size, learning_rate);
        }
    }

    /// Forward pass without touching the loss
    pub fn predict(&mut self, input: &Tensor) -> Tensor {
        self.forward(input)
    }

    /// Forward pass followed by argmax over the final output
    pub fn predict_class(&mut self, input: &Tensor) -> usize {
        self.forward(input).argmax()
    }

    /// Switch every dropout layer in the chain between train and test mode
    pub fn set_dropout_mode(&mut self, mode: DropoutMode) {
        for layer in &mut self.layers {
            layer.set_dropout_mode(mode);
        }
    }
}
