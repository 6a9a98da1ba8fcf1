//! ReLU Activation
//!
//! `ReLU(x) = max(0, x)` element-wise over a cube. The backward pass
//! multiplies the upstream gradient by the indicator of `input > 0`; the
//! subgradient at exactly 0 is taken as 0.

use crate::tensor::Tensor;

/// Rectified linear unit over a fixed-shape cube
pub struct ReLU {
    input_height: usize,
    input_width: usize,
    input_depth: usize,

    input: Tensor,
    output: Tensor,
    grad_input: Tensor,
}

impl ReLU {
    /// Create a ReLU for inputs shaped `[input_height, input_width, input_depth]`
    pub fn new(input_height: usize, input_width: usize, input_depth: usize) -> Self {
        Self {
            input_height,
            input_width,
            input_depth,
            input: Tensor::empty(),
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
        }
    }

    /// Forward pass: clamp negatives to zero, cache input and output
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape,
            vec![self.input_height, self.input_width, self.input_depth],
            "ReLU input shape {:?} doesn't match configured shape [{}, {}, {}]",
            input.shape,
            self.input_height,
            self.input_width,
            self.input_depth
        );

        let output = input.map(|x| x.max(0.0));
        self.input = input.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass: gradient flows only where the input was positive
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match ReLU output shape {:?}",
            upstream.shape, self.output.shape
        );

        let indicator = self.input.map(|x| if x > 0.0 { 1.0 } else { 0.0 });
        self.grad_input = indicator.hadamard(upstream);
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
    fn test_forward_clamps_negatives() {
        let mut layer = ReLU::new(1, 2, 2);
        let x = Tensor::new(vec![-1.0, 2.0, 0.0, -0.5], vec![1, 2, 2]);
        let out = layer.forward(&x);
        assert_eq!(out.data, vec![0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_backward_gates_on_positive_input() {
        let mut layer = ReLU::new(1, 2, 2);
        let x = Tensor::new(vec![-1.0, 2.0, 0.0, 3.0], vec![1, 2, 2]);
        layer.forward(&x);
        layer.backward(&Tensor::new(vec![10.0, 10.0, 10.0, 10.0], vec![1, 2, 2]));

        // Subgradient at exactly 0 is 0
        assert_eq!(layer.gradient_wrt_input().data, vec![0.0, 10.0, 0.0, 10.0]);
    }

    #[test]
    #[should_panic(expected = "doesn't match ReLU output shape")]
    fn test_backward_rejects_wrong_gradient_shape() {
        let mut layer = ReLU::new(2, 2, 1);
        layer.forward(&Tensor::zeros(vec![2, 2, 1]));
        layer.backward(&Tensor::zeros(vec![1, 2, 2]));
    }
}
