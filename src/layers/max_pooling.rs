//! Max Pooling Layer
//!
//! Downsamples each depth slice of a cube independently by taking the
//! maximum over stride-stepped windows. Uses the same valid-window
//! arithmetic as convolution: `(input - window) % stride == 0` on both
//! axes, output spatial size `(input - window)/stride + 1`, checked at
//! construction.
//!
//! ## Backward Pass: Argmax Routing
//!
//! Max pooling has no parameters; its backward pass is pure routing. For
//! each window, the cached input window is re-scanned for its maximum and
//! the window's entire upstream gradient value lands on exactly that input
//! location — every other position in the window contributed nothing to
//! the forward max, so its gradient is zero. Ties break to the first
//! occurrence in row-major scan order. When windows overlap (stride <
//! window size), routed values sum at shared input locations.

use crate::tensor::Tensor;
use rayon::prelude::*;

/// Per-slice max pooling over valid windows
pub struct MaxPooling {
    input_height: usize,
    input_width: usize,
    input_depth: usize,
    window_height: usize,
    window_width: usize,
    vertical_stride: usize,
    horizontal_stride: usize,

    // Single-slot caches from the most recent forward/backward pair.
    input: Tensor,
    output: Tensor,
    grad_input: Tensor,
}

impl MaxPooling {
    /// Create a pooling layer
    ///
    /// # Panics
    ///
    /// Panics when the window overhangs the input or the stride doesn't
    /// tile `(input - window)` exactly on either axis (same rule as
    /// [`Conv2D`](crate::layers::Conv2D)).
    pub fn new(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        window_height: usize,
        window_width: usize,
        vertical_stride: usize,
        horizontal_stride: usize,
    ) -> Self {
        assert!(
            input_depth > 0 && vertical_stride > 0 && horizontal_stride > 0,
            "MaxPooling depth and strides must be nonzero"
        );
        assert!(
            window_height > 0 && window_height <= input_height
                && window_width > 0 && window_width <= input_width,
            "Pooling window {}x{} doesn't fit input {}x{}",
            window_height,
            window_width,
            input_height,
            input_width
        );
        assert_eq!(
            (input_height - window_height) % vertical_stride,
            0,
            "Vertical stride {} doesn't tile input height {} with window height {}",
            vertical_stride,
            input_height,
            window_height
        );
        assert_eq!(
            (input_width - window_width) % horizontal_stride,
            0,
            "Horizontal stride {} doesn't tile input width {} with window width {}",
            horizontal_stride,
            input_width,
            window_width
        );

        Self {
            input_height,
            input_width,
            input_depth,
            window_height,
            window_width,
            vertical_stride,
            horizontal_stride,
            input: Tensor::empty(),
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
        }
    }

    /// Spatial output height
    pub fn output_height(&self) -> usize {
        (self.input_height - self.window_height) / self.vertical_stride + 1
    }

    /// Spatial output width
    pub fn output_width(&self) -> usize {
        (self.input_width - self.window_width) / self.horizontal_stride + 1
    }

    /// Output shape `[output_height, output_width, input_depth]`
    pub fn output_shape(&self) -> Vec<usize> {
        vec![self.output_height(), self.output_width(), self.input_depth]
    }

    /// Forward pass: per-window maximum, slice by slice
    ///
    /// # Panics
    ///
    /// Panics if the input shape disagrees with the construction-time shape.
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape,
            vec![self.input_height, self.input_width, self.input_depth],
            "MaxPooling input shape {:?} doesn't match configured shape [{}, {}, {}]",
            input.shape,
            self.input_height,
            self.input_width,
            self.input_depth
        );

        let out_h = self.output_height();
        let out_w = self.output_width();
        let depth = self.input_depth;
        let (wh, ww) = (self.window_height, self.window_width);
        let (sv, sh) = (self.vertical_stride, self.horizontal_stride);

        let mut out = vec![0.0; out_h * out_w * depth];
        // Each chunk is one (r, c) cell across all depth slices
        out.par_chunks_mut(depth).enumerate().for_each(|(pos, cell)| {
            let r0 = (pos / out_w) * sv;
            let c0 = (pos % out_w) * sh;
            for (d, slot) in cell.iter_mut().enumerate() {
                let mut max = f64::NEG_INFINITY;
                for i in 0..wh {
                    for j in 0..ww {
                        let v = input.at(r0 + i, c0 + j, d);
                        if v > max {
                            max = v;
                        }
                    }
                }
                *slot = max;
            }
        });

        let output = Tensor::new(out, vec![out_h, out_w, depth]);
        self.input = input.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass: route each window's gradient to its argmax
    ///
    /// The output gradient tensor has the input's shape. Overlapping
    /// windows sum their routed values at shared locations.
    ///
    /// # Panics
    ///
    /// Panics if the upstream gradient's shape disagrees with the last
    /// cached output.
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match MaxPooling output shape {:?}",
            upstream.shape, self.output.shape
        );

        let out_h = self.output_height();
        let out_w = self.output_width();
        let (wh, ww) = (self.window_height, self.window_width);
        let (sv, sh) = (self.vertical_stride, self.horizontal_stride);

        let mut grad_input = Tensor::zeros(vec![
            self.input_height,
            self.input_width,
            self.input_depth,
        ]);

        for d in 0..self.input_depth {
            for r in 0..out_h {
                for c in 0..out_w {
                    let (r0, c0) = (r * sv, c * sh);

                    // Re-scan the cached window; ties break to the first
                    // occurrence in row-major order
                    let (mut best_i, mut best_j) = (0, 0);
                    let mut best = f64::NEG_INFINITY;
                    for i in 0..wh {
                        for j in 0..ww {
                            let v = self.input.at(r0 + i, c0 + j, d);
                            if v > best {
                                best = v;
                                best_i = i;
                                best_j = j;
                            }
                        }
                    }

                    *grad_input.at_mut(r0 + best_i, c0 + best_j, d) += upstream.at(r, c, d);
                }
            }
        }

        self.grad_input = grad_input;
    }

    /// Gradient w.r.t. the last forward input (input-shaped cube)
    pub fn gradient_wrt_input(&self) -> &Tensor {
        &self.grad_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_shape_law() {
        // Same rule as convolution: ((in - window)/stride + 1), depth kept
        let layer = MaxPooling::new(24, 24, 6, 2, 2, 2, 2);
        assert_eq!(layer.output_shape(), vec![12, 12, 6]);

        let layer = MaxPooling::new(9, 6, 2, 3, 2, 3, 2);
        assert_eq!(layer.output_shape(), vec![3, 3, 2]);
    }

    #[test]
    #[should_panic(expected = "doesn't tile input width")]
    fn test_indivisible_stride_is_fatal() {
        // (5 - 2) % 2 != 0 on the width axis
        MaxPooling::new(4, 5, 1, 2, 2, 2, 2);
    }

    #[test]
    fn test_forward_and_routing_4x4() {
        // The canonical 4x4 / 2x2-window / stride-2 example: four disjoint
        // windows, one max each
        let input = Tensor::new(
            vec![
                1.0, 3.0, 2.0, 4.0, //
                5.0, 6.0, 7.0, 8.0, //
                9.0, 2.0, 1.0, 0.0, //
                3.0, 4.0, 5.0, 6.0,
            ],
            vec![4, 4, 1],
        );

        let mut layer = MaxPooling::new(4, 4, 1, 2, 2, 2, 2);
        let out = layer.forward(&input);
        assert_eq!(out.shape, vec![2, 2, 1]);
        assert_eq!(out.data, vec![6.0, 8.0, 9.0, 6.0]);

        layer.backward(&Tensor::new(vec![1.0; 4], vec![2, 2, 1]));
        let gi = layer.gradient_wrt_input();
        assert_eq!(gi.shape, vec![4, 4, 1]);

        // Exactly one nonzero entry (value 1) per window, at its argmax
        let expected = vec![
            0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 1.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        assert_eq!(gi.data, expected);
    }

    #[test]
    fn test_tie_breaks_to_first_in_row_major_order() {
        let input = Tensor::new(vec![7.0, 7.0, 7.0, 7.0], vec![2, 2, 1]);
        let mut layer = MaxPooling::new(2, 2, 1, 2, 2, 1, 1);
        layer.forward(&input);
        layer.backward(&Tensor::new(vec![5.0], vec![1, 1, 1]));

        assert_eq!(layer.gradient_wrt_input().data, vec![5.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overlapping_windows_sum_routed_gradient() {
        // 3x3 input, 2x2 window, stride 1: the center value is the max of
        // all four windows, so all four upstream entries land on it
        let input = Tensor::new(
            vec![
                0.0, 0.0, 0.0, //
                0.0, 9.0, 0.0, //
                0.0, 0.0, 0.0,
            ],
            vec![3, 3, 1],
        );
        let mut layer = MaxPooling::new(3, 3, 1, 2, 2, 1, 1);
        layer.forward(&input);
        layer.backward(&Tensor::new(vec![1.0; 4], vec![2, 2, 1]));

        assert_eq!(layer.gradient_wrt_input().at(1, 1, 0), 4.0);
        let total: f64 = layer.gradient_wrt_input().data.iter().sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn test_slices_pool_independently() {
        // Depth 2: slice 0 peaks top-left, slice 1 peaks bottom-right
        let mut input = Tensor::zeros(vec![2, 2, 2]);
        *input.at_mut(0, 0, 0) = 5.0;
        *input.at_mut(1, 1, 1) = 7.0;

        let mut layer = MaxPooling::new(2, 2, 2, 2, 2, 1, 1);
        let out = layer.forward(&input);
        assert_eq!(out.data, vec![5.0, 7.0]);

        layer.backward(&Tensor::new(vec![1.0, 1.0], vec![1, 1, 2]));
        assert_eq!(layer.gradient_wrt_input().at(0, 0, 0), 1.0);
        assert_eq!(layer.gradient_wrt_input().at(1, 1, 1), 1.0);
    }

    #[test]
    #[should_panic(expected = "doesn't match MaxPooling output shape")]
    fn test_backward_rejects_wrong_gradient_shape() {
        let mut layer = MaxPooling::new(4, 4, 1, 2, 2, 2, 2);
        layer.forward(&Tensor::zeros(vec![4, 4, 1]));
        layer.backward(&Tensor::zeros(vec![4, 4, 1]));
    }
}
