//! Sigmoid Activation
//!
//! `σ(x) = 1 / (1 + e^{-x})` element-wise over a vector. The derivative
//! reuses the cached output: `σ'(x) = σ(x)·(1 − σ(x))`.

use crate::tensor::Tensor;

/// Logistic sigmoid over a fixed-length vector
pub struct Sigmoid {
    num_inputs: usize,

    input: Tensor,
    output: Tensor,
    grad_input: Tensor,
}

impl Sigmoid {
    /// Create a sigmoid for vectors of length `num_inputs`
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
            "Sigmoid input shape {:?} doesn't match configured length {}",
            input.shape,
            self.num_inputs
        );

        let output = input.map(|x| 1.0 / (1.0 + (-x).exp()));
        self.input = input.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass: `grad_input = output ⊙ (1 − output) ⊙ upstream`
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match sigmoid output shape {:?}",
            upstream.shape, self.output.shape
        );

        let local = self.output.map(|y| y * (1.0 - y));
        self.grad_input = local.hadamard(upstream);
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
    fn test_forward_known_values() {
        let mut layer = Sigmoid::new(3);
        let out = layer.forward(&Tensor::vector(vec![0.0, 100.0, -100.0]));

        assert!((out.data[0] - 0.5).abs() < 1e-12);
        assert!((out.data[1] - 1.0).abs() < 1e-12);
        assert!(out.data[2].abs() < 1e-12);
    }

    #[test]
    fn test_backward_peak_derivative_at_zero() {
        let mut layer = Sigmoid::new(1);
        layer.forward(&Tensor::vector(vec![0.0]));
        layer.backward(&Tensor::vector(vec![1.0]));

        // σ'(0) = 0.25
        assert!((layer.gradient_wrt_input().data[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "doesn't match configured length")]
    fn test_forward_rejects_wrong_length() {
        let mut layer = Sigmoid::new(2);
        layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0]));
    }
}
