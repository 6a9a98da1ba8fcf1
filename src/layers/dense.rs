//! Dense Layer (Fully Connected)
//!
//! The dense layer is the fundamental building block of the engine.
//! It performs an affine transformation: y = W·x + b
//!
//! ## Forward Pass
//!
//! ```text
//! Input:  x [num_inputs]
//! Weight: W [num_outputs, num_inputs]
//! Bias:   b [num_outputs]
//! Output: y = W·x + b [num_outputs]
//! ```
//!
//! A 3-D input is accepted and flattened in row-major order, so a dense
//! layer can sit directly behind convolution or pooling.
//!
//! ## Backward Pass
//!
//! Using the chain rule, with upstream gradient g [num_outputs]:
//! ```text
//! grad_x[j] = Σᵢ W[i][j] · g[i]      (Wᵀ · g)
//! grad_W[i] = x · g[i]               (outer product row)
//! grad_b    = g
//! ```
//!
//! All three are recomputed per sample and also accumulate into
//! per-minibatch running sums. `update_parameters(B, lr)` applies the
//! averaged weight/bias step and clears all the sums, so the accumulators
//! are zero exactly at minibatch boundaries. (The input-gradient sum isn't
//! consumed by the update — it's observable state for drivers that want
//! the batch-aggregate signal reaching this layer.)
//!
//! ## Implementation Notes
//!
//! - Output rows (forward) and weight rows / input columns (backward) are
//!   independent, so those loops parallelize with Rayon.
//! - The cached input/output are single-slot: one in-flight example per
//!   layer instance.

use crate::init::WeightInitializer;
use crate::rng::RandomGenerator;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// Fully connected layer with minibatch gradient accumulation
///
/// Weights and biases are public so drivers and tests can inspect or set
/// them directly; everything else is forward/backward cache state.
pub struct Dense {
    num_inputs: usize,
    num_outputs: usize,

    /// Weight matrix [num_outputs, num_inputs]
    pub weights: Tensor,
    /// Bias vector [num_outputs]
    pub biases: Tensor,

    // Single-slot caches from the most recent forward/backward pair.
    input: Tensor,
    input_shape: Vec<usize>,
    output: Tensor,
    grad_input: Tensor,
    grad_weights: Tensor,
    grad_biases: Tensor,

    // Per-minibatch accumulators; zero at batch start and after update.
    acc_grad_input: Tensor,
    acc_grad_weights: Tensor,
    acc_grad_biases: Tensor,
}

impl Dense {
    /// Create a dense layer with freshly initialized parameters
    ///
    /// # Arguments
    ///
    /// * `num_inputs` - Input dimension (fan-in for the initializer)
    /// * `num_outputs` - Output dimension
    /// * `initializer` - Weight scheme name (`"xavier"`, `"he"`, `"small_rand"`)
    /// * `rng` - Generator to draw the initial weights from
    ///
    /// Biases start at zero.
    ///
    /// # Panics
    ///
    /// Panics on an unknown initializer name or zero dimensions.
    pub fn new(
        num_inputs: usize,
        num_outputs: usize,
        initializer: &str,
        rng: &mut RandomGenerator,
    ) -> Self {
        assert!(
            num_inputs > 0 && num_outputs > 0,
            "Dense layer dimensions must be nonzero: {}x{}",
            num_outputs,
            num_inputs
        );

        let init = WeightInitializer::new(initializer, num_inputs);
        let weight_data: Vec<f64> = (0..num_outputs * num_inputs)
            .map(|_| init.sample(rng))
            .collect();

        Self {
            num_inputs,
            num_outputs,
            weights: Tensor::new(weight_data, vec![num_outputs, num_inputs]),
            biases: Tensor::zeros(vec![num_outputs]),
            input: Tensor::empty(),
            input_shape: Vec::new(),
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
            grad_weights: Tensor::empty(),
            grad_biases: Tensor::empty(),
            acc_grad_input: Tensor::zeros(vec![num_inputs]),
            acc_grad_weights: Tensor::zeros(vec![num_outputs, num_inputs]),
            acc_grad_biases: Tensor::zeros(vec![num_outputs]),
        }
    }

    /// Forward pass: y = W·x + b
    ///
    /// Caches the (flattened) input and the output for the backward pass.
    /// A 3-D input is flattened row-major; its original shape is remembered
    /// so `gradient_wrt_input` can be handed straight back to a cube layer.
    ///
    /// # Panics
    ///
    /// Panics if the input element count doesn't match `num_inputs`.
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        let x = if input.shape.len() == 1 {
            input.clone()
        } else {
            input.flatten()
        };
        assert_eq!(
            x.len(),
            self.num_inputs,
            "Dense input length ({}) doesn't match layer fan-in ({})",
            x.len(),
            self.num_inputs
        );

        let n_in = self.num_inputs;
        let mut out = vec![0.0; self.num_outputs];
        // Output rows are independent
        out.par_iter_mut().enumerate().for_each(|(i, o)| {
            let row = &self.weights.data[i * n_in..(i + 1) * n_in];
            *o = row.iter().zip(&x.data).map(|(w, v)| w * v).sum::<f64>() + self.biases.data[i];
        });

        let output = Tensor::vector(out);
        self.input = x;
        self.input_shape = input.shape.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass
    ///
    /// Computes the three gradients and adds the weight/bias gradients to
    /// the minibatch accumulators.
    ///
    /// # Panics
    ///
    /// Panics if the upstream gradient's shape disagrees with the last
    /// cached output (which also catches "backward before forward").
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match dense output shape {:?}",
            upstream.shape, self.output.shape
        );

        let n_in = self.num_inputs;
        let n_out = self.num_outputs;

        // grad_input[j] = Σᵢ W[i][j]·g[i]; columns are independent
        let weights = &self.weights.data;
        let g = &upstream.data;
        let mut grad_input = vec![0.0; n_in];
        grad_input.par_iter_mut().enumerate().for_each(|(j, slot)| {
            let mut sum = 0.0;
            for i in 0..n_out {
                sum += weights[i * n_in + j] * g[i];
            }
            *slot = sum;
        });
        // Hand the gradient back in the caller's original input shape
        self.grad_input = Tensor::new(grad_input, self.input_shape.clone());
        // The accumulator stays flat regardless of the input's shape
        self.acc_grad_input
            .data
            .iter_mut()
            .zip(&self.grad_input.data)
            .for_each(|(a, g)| *a += g);

        // grad_W[i][:] = x·g[i]; rows are independent
        let x = &self.input.data;
        let mut grad_weights = vec![0.0; n_out * n_in];
        grad_weights
            .par_chunks_mut(n_in)
            .enumerate()
            .for_each(|(i, row)| {
                let gi = g[i];
                for (slot, xv) in row.iter_mut().zip(x) {
                    *slot = gi * xv;
                }
            });
        self.grad_weights = Tensor::new(grad_weights, vec![n_out, n_in]);
        self.grad_biases = upstream.clone();

        self.acc_grad_weights.accumulate(&self.grad_weights);
        self.acc_grad_biases.accumulate(&self.grad_biases);
    }

    /// Apply the accumulated minibatch step and clear the accumulators
    ///
    /// ```text
    /// W -= lr · (ΣgradW / batch_size)
    /// b -= lr · (Σgradb / batch_size)
    /// ```
    ///
    /// Calling this again without an intervening backward applies a zero
    /// step: the accumulators were just cleared.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn update_parameters(&mut self, batch_size: usize, learning_rate: f64) {
        assert!(batch_size > 0, "Batch size must be nonzero");
        let step = learning_rate / batch_size as f64;

        self.weights
            .data
            .par_iter_mut()
            .zip(&self.acc_grad_weights.data)
            .for_each(|(w, acc)| *w -= step * acc);
        self.biases
            .data
            .iter_mut()
            .zip(&self.acc_grad_biases.data)
            .for_each(|(b, acc)| *b -= step * acc);

        self.acc_grad_input.fill(0.0);
        self.acc_grad_weights.fill(0.0);
        self.acc_grad_biases.fill(0.0);
    }

    /// Gradient w.r.t. the last forward input, in that input's shape
    pub fn gradient_wrt_input(&self) -> &Tensor {
        &self.grad_input
    }

    /// Sum of per-sample input gradients since the last update (flat vector)
    pub fn accumulated_gradient_wrt_input(&self) -> &Tensor {
        &self.acc_grad_input
    }

    /// Per-sample gradient w.r.t. the weights from the last backward
    pub fn gradient_wrt_weights(&self) -> &Tensor {
        &self.grad_weights
    }

    /// Per-sample gradient w.r.t. the biases from the last backward
    pub fn gradient_wrt_biases(&self) -> &Tensor {
        &self.grad_biases
    }

    /// Input dimension
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Output dimension
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_dense() -> Dense {
        // Known parameters: W = [[1, 1]], b = [0]
        let mut rng = RandomGenerator::from_seed(0);
        let mut layer = Dense::new(2, 1, "xavier", &mut rng);
        layer.weights = Tensor::new(vec![1.0, 1.0], vec![1, 2]);
        layer.biases = Tensor::zeros(vec![1]);
        layer
    }

    #[test]
    fn test_forward_backward_known_values() {
        let mut layer = unit_dense();

        let out = layer.forward(&Tensor::vector(vec![1.0, 1.0]));
        assert_eq!(out.data, vec![2.0]);

        layer.backward(&Tensor::vector(vec![1.0]));
        assert_eq!(layer.gradient_wrt_weights().data, vec![1.0, 1.0]);
        assert_eq!(layer.gradient_wrt_biases().data, vec![1.0]);
        assert_eq!(layer.gradient_wrt_input().data, vec![1.0, 1.0]);
    }

    #[test]
    fn test_accumulation_law() {
        // Accumulating the same gradient B times then updating must equal
        // a single-sample step at the same learning rate.
        let x = Tensor::vector(vec![0.5, -1.5]);
        let g = Tensor::vector(vec![2.0]);
        let batch = 4;

        let mut batched = unit_dense();
        for _ in 0..batch {
            batched.forward(&x);
            batched.backward(&g);
        }
        batched.update_parameters(batch, 0.1);

        let mut single = unit_dense();
        single.forward(&x);
        single.backward(&g);
        single.update_parameters(1, 0.1);

        for (a, b) in batched.weights.data.iter().zip(&single.weights.data) {
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in batched.biases.data.iter().zip(&single.biases.data) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_input_gradient_accumulates_and_clears() {
        let mut layer = unit_dense();
        let x = Tensor::vector(vec![1.0, 2.0]);
        let g = Tensor::vector(vec![1.0]);

        for _ in 0..3 {
            layer.forward(&x);
            layer.backward(&g);
        }
        // Same per-sample gradient three times: accumulator is 3·g
        assert_eq!(layer.accumulated_gradient_wrt_input().data, vec![3.0, 3.0]);

        layer.update_parameters(3, 0.1);
        assert_eq!(layer.accumulated_gradient_wrt_input().data, vec![0.0, 0.0]);
    }

    #[test]
    fn test_update_without_backward_is_noop() {
        let mut layer = unit_dense();
        layer.forward(&Tensor::vector(vec![1.0, 2.0]));
        layer.backward(&Tensor::vector(vec![1.0]));
        layer.update_parameters(1, 0.5);

        let weights_after = layer.weights.data.clone();
        let biases_after = layer.biases.data.clone();

        // Accumulators were cleared; a second update applies a zero step
        layer.update_parameters(1, 0.5);
        assert_eq!(layer.weights.data, weights_after);
        assert_eq!(layer.biases.data, biases_after);
    }

    #[test]
    fn test_cube_input_flattens_and_grad_returns_cube() {
        let mut rng = RandomGenerator::from_seed(3);
        let mut layer = Dense::new(8, 2, "xavier", &mut rng);

        let cube = Tensor::new((0..8).map(|i| i as f64).collect(), vec![2, 2, 2]);
        let out = layer.forward(&cube);
        assert_eq!(out.shape, vec![2]);

        layer.backward(&Tensor::vector(vec![1.0, -1.0]));
        assert_eq!(layer.gradient_wrt_input().shape, vec![2, 2, 2]);
    }

    #[test]
    #[should_panic(expected = "doesn't match dense output shape")]
    fn test_backward_rejects_wrong_gradient_length() {
        let mut rng = RandomGenerator::from_seed(1);
        let mut layer = Dense::new(3, 2, "xavier", &mut rng);
        layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0]));
        layer.backward(&Tensor::vector(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    #[should_panic(expected = "doesn't match layer fan-in")]
    fn test_forward_rejects_wrong_input_length() {
        let mut rng = RandomGenerator::from_seed(1);
        let mut layer = Dense::new(3, 2, "xavier", &mut rng);
        layer.forward(&Tensor::vector(vec![1.0, 2.0]));
    }
}
