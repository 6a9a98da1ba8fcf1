//! Softmax Activation
//!
//! Maps a vector of scores to a probability distribution:
//!
//! ```text
//! softmax(x)[i] = exp(x[i] - max(x)) / Σⱼ exp(x[j] - max(x))
//! ```
//!
//! Subtracting the maximum prevents overflow in `exp` while producing the
//! same result — softmax is invariant to adding a constant to every score,
//! since the shift factors out of numerator and denominator alike.
//!
//! ## Backward Pass
//!
//! The softmax Jacobian is dense (every output depends on every input),
//! but its product with an upstream vector g collapses to
//!
//! ```text
//! grad_input = output ⊙ (g - dot(g, output))
//! ```
//!
//! which is what this layer computes — no materialized Jacobian.

use crate::tensor::Tensor;

/// Numerically stable softmax over a fixed-length vector
pub struct Softmax {
    num_inputs: usize,

    input: Tensor,
    output: Tensor,
    grad_input: Tensor,
}

impl Softmax {
    /// Create a softmax for vectors of length `num_inputs`
    pub fn new(num_inputs: usize) -> Self {
        Self {
            num_inputs,
            input: Tensor::empty(),
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
        }
    }

    /// Forward pass, caching input and output
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape,
            vec![self.num_inputs],
            "Softmax input shape {:?} doesn't match configured length {}",
            input.shape,
            self.num_inputs
        );

        // Shift by the max for numerical stability
        let max = input.max();
        let exp_values: Vec<f64> = input.data.iter().map(|&x| (x - max).exp()).collect();
        let sum: f64 = exp_values.iter().sum();
        let output = Tensor::vector(exp_values.into_iter().map(|v| v / sum).collect());

        self.input = input.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass: Jacobian-vector product against the cached output
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match softmax output shape {:?}",
            upstream.shape, self.output.shape
        );

        let projection = upstream.dot(&self.output);
        let grad: Vec<f64> = self
            .output
            .data
            .iter()
            .zip(&upstream.data)
            .map(|(&y, &g)| y * (g - projection))
            .collect();
        self.grad_input = Tensor::vector(grad);
    }

    /// Gradient w.r.t. the last forward input
    pub fn gradient_wrt_input(&self) -> &Tensor {
        &self.grad_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_a_distribution() {
        let mut layer = Softmax::new(4);
        let out = layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0, 4.0]));

        assert!(out.data.iter().all(|&p| (0.0..=1.0).contains(&p)));
        let sum: f64 = out.data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_translation_invariance() {
        let mut layer = Softmax::new(3);
        let base = layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0]));
        let shifted = layer.forward(&Tensor::vector(vec![101.0, 102.0, 103.0]));

        for (a, b) in base.data.iter().zip(&shifted.data) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_large_scores_do_not_overflow() {
        let mut layer = Softmax::new(2);
        let out = layer.forward(&Tensor::vector(vec![1000.0, 1001.0]));

        assert!(out.data.iter().all(|p| p.is_finite()));
        let sum: f64 = out.data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_backward_sums_to_zero() {
        // Softmax outputs sum to 1 for any input, so the gradient of that
        // sum along any upstream direction is 0
        let mut layer = Softmax::new(3);
        layer.forward(&Tensor::vector(vec![0.3, -1.2, 2.0]));
        layer.backward(&Tensor::vector(vec![0.5, -0.25, 1.5]));

        let total: f64 = layer.gradient_wrt_input().data.iter().sum();
        assert!(total.abs() < 1e-12);
    }

    #[test]
    fn test_uniform_scores_give_uniform_distribution() {
        let mut layer = Softmax::new(4);
        let out = layer.forward(&Tensor::vector(vec![7.0; 4]));
        for &p in &out.data {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }
}
