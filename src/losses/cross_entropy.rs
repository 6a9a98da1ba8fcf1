//! Cross-Entropy Loss
//!
//! For a predicted distribution p and a target distribution a (typically
//! one-hot), the loss is `-Σᵢ a[i]·ln(p[i])` and the gradient w.r.t. the
//! prediction is `-(a ⊘ p)` element-wise.
//!
//! ## Numerical Contract
//!
//! The formula is undefined where a supported class (`a[i] > 0`) has a
//! non-positive predicted probability: `ln(p)` diverges and `a/p` divides
//! by zero. Rather than letting a NaN slip into the backward pass and
//! silently corrupt every parameter in the network, the forward pass
//! rejects such predictions with a panic. Entries with `a[i] == 0`
//! contribute nothing to the loss or gradient (the `a·ln(p)` and `a/p`
//! terms are taken at their zero limit), so a zero prediction at an
//! unsupported class is fine.

use crate::tensor::Tensor;

/// Cross-entropy between a predicted and an actual distribution
pub struct CrossEntropyLoss {
    num_inputs: usize,

    predicted: Tensor,
    actual: Tensor,
    loss: f64,
    grad_predicted: Tensor,
}

impl CrossEntropyLoss {
    /// Create a loss over distributions of length `num_inputs`
    pub fn new(num_inputs: usize) -> Self {
        Self {
            num_inputs,
            predicted: Tensor::empty(),
            actual: Tensor::empty(),
            loss: 0.0,
            grad_predicted: Tensor::empty(),
        }
    }

    /// Compute the loss and cache both distributions for the backward pass
    ///
    /// # Panics
    ///
    /// Panics if either vector's length disagrees with `num_inputs`, or if
    /// any supported class has a non-positive predicted probability.
    pub fn forward(&mut self, predicted: &Tensor, actual: &Tensor) -> f64 {
        assert_eq!(
            predicted.shape,
            vec![self.num_inputs],
            "Predicted distribution shape {:?} doesn't match loss length {}",
            predicted.shape,
            self.num_inputs
        );
        assert_eq!(
            actual.shape,
            vec![self.num_inputs],
            "Actual distribution shape {:?} doesn't match loss length {}",
            actual.shape,
            self.num_inputs
        );

        let mut loss = 0.0;
        for (i, (&p, &a)) in predicted.data.iter().zip(&actual.data).enumerate() {
            if a > 0.0 {
                assert!(
                    p > 0.0,
                    "Cross-entropy undefined: predicted probability {} at supported class {}",
                    p,
                    i
                );
                loss -= a * p.ln();
            }
        }

        self.predicted = predicted.clone();
        self.actual = actual.clone();
        self.loss = loss;
        loss
    }

    /// Compute the gradient w.r.t. the cached prediction: `-(a ⊘ p)`
    pub fn backward(&mut self) {
        let grad: Vec<f64> = self
            .predicted
            .data
            .iter()
            .zip(&self.actual.data)
            .map(|(&p, &a)| if a == 0.0 { 0.0 } else { -a / p })
            .collect();
        self.grad_predicted = Tensor::vector(grad);
    }

    /// Gradient w.r.t. the predicted distribution from the last backward
    pub fn gradient_wrt_predicted(&self) -> &Tensor {
        &self.grad_predicted
    }

    /// Loss value from the last forward
    pub fn loss(&self) -> f64 {
        self.loss
    }
}
