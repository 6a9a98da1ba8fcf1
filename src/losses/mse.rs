//! Mean Squared Error Loss
//!
//! `Forward = Σᵢ (actual[i] - predicted[i])²` over vectors of any matching
//! length. The backward pass is `n · 2 · (predicted - actual)` where `n`
//! is the label-vector length — for scalar regression (n = 1) the leading
//! factor is a no-op, and it is kept exactly as specified for longer
//! labels.

use crate::tensor::Tensor;

/// Sum-of-squares loss over matching-length vectors
pub struct MSELoss {
    predicted: Tensor,
    actual: Tensor,
    loss: f64,
    grad_predicted: Tensor,
}

impl MSELoss {
    pub fn new() -> Self {
        Self {
            predicted: Tensor::empty(),
            actual: Tensor::empty(),
            loss: 0.0,
            grad_predicted: Tensor::empty(),
        }
    }

    /// Compute the loss and cache both vectors for the backward pass
    ///
    /// # Panics
    ///
    /// Panics if the two vectors' shapes differ.
    pub fn forward(&mut self, predicted: &Tensor, actual: &Tensor) -> f64 {
        assert_eq!(
            predicted.shape, actual.shape,
            "Predicted shape {:?} doesn't match actual shape {:?}",
            predicted.shape, actual.shape
        );

        let diff = actual.sub(predicted);
        let loss = diff.dot(&diff);

        self.predicted = predicted.clone();
        self.actual = actual.clone();
        self.loss = loss;
        loss
    }

    /// Compute the gradient w.r.t. the cached prediction:
    /// `n · 2 · (predicted - actual)`
    pub fn backward(&mut self) {
        let n = self.predicted.len() as f64;
        self.grad_predicted = self.predicted.sub(&self.actual).scale(2.0 * n);
    }

    /// Gradient w.r.t. the predicted vector from the last backward
    pub fn gradient_wrt_predicted(&self) -> &Tensor {
        &self.grad_predicted
    }

    /// Loss value from the last forward
    pub fn loss(&self) -> f64 {
        self.loss
    }
}

impl Default for MSELoss {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_give_zero_loss() {
        let mut loss = MSELoss::new();
        let p = Tensor::vector(vec![0.3, -1.5, 2.0]);
        assert_eq!(loss.forward(&p, &p), 0.0);
    }

    #[test]
    fn test_known_value() {
        let mut loss = MSELoss::new();
        let l = loss.forward(
            &Tensor::vector(vec![1.0, 2.0]),
            &Tensor::vector(vec![3.0, 0.0]),
        );
        // (3-1)² + (0-2)² = 8
        assert_eq!(l, 8.0);
    }

    #[test]
    fn test_scalar_backward_has_no_length_scaling() {
        let mut loss = MSELoss::new();
        loss.forward(&Tensor::vector(vec![0.8]), &Tensor::vector(vec![1.0]));
        loss.backward();

        // n = 1: gradient is plain 2(p - a)
        assert!((loss.gradient_wrt_predicted().data[0] - (-0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_vector_backward_scales_by_length() {
        let mut loss = MSELoss::new();
        loss.forward(
            &Tensor::vector(vec![1.0, 0.0]),
            &Tensor::vector(vec![0.0, 0.0]),
        );
        loss.backward();

        // n = 2: gradient is 2·2·(p - a)
        assert_eq!(loss.gradient_wrt_predicted().data, vec![4.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "doesn't match actual shape")]
    fn test_shape_mismatch_is_fatal() {
        let mut loss = MSELoss::new();
        loss.forward(
            &Tensor::vector(vec![1.0]),
            &Tensor::vector(vec![1.0, 2.0]),
        );
    }
}
