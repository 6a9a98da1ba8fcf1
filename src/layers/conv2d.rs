//! 2D Convolution Layer
//!
//! Valid (no-padding) convolution of a `height × width × depth` input cube
//! against a bank of learnable filters, each spanning the input's full
//! depth. This is the computational heart of the engine and the layer where
//! backpropagation is easiest to get subtly wrong.
//!
//! ## Window Arithmetic
//!
//! A filter of size `fh × fw` stepped with strides `(sv, sh)` over an
//! `ih × iw` input is only well defined when the windows tile exactly:
//!
//! ```text
//! (ih - fh) % sv == 0    and    (iw - fw) % sh == 0
//! output spatial size = ((ih - fh)/sv + 1, (iw - fw)/sh + 1)
//! output depth        = num_filters
//! ```
//!
//! Violating the divisibility rule is a configuration error and is rejected
//! at construction, before any forward pass.
//!
//! ## Forward Pass
//!
//! ```text
//! output[r][c][f] = dot(input patch at (r·sv, c·sh), filter f)
//! ```
//!
//! ## Backward Pass
//!
//! Given upstream gradient g shaped like the output:
//!
//! - **grad_input** (overlap-add): each output cell `(r, c, f)` saw one
//!   input patch through filter f, so the filter's values, scaled by
//!   `g[r][c][f]`, are that cell's gradient contribution to the patch.
//!   When stride < filter size the patches overlap, and contributions to
//!   the same input location sum across all (filter, position) pairs that
//!   covered it.
//! - **grad_filters** (cross-correlation): `grad_filters[f] +=
//!   Σ_{r,c} g[r][c][f] · (input patch at (r, c))`.
//!
//! Both gradients accumulate per-sample into minibatch accumulators;
//! `update_parameters` averages the filter accumulators into a step, then
//! clears everything (the input-gradient sum is observable state only —
//! there is no parameter behind it to step).
//!
//! ## Parallelism
//!
//! The forward pass parallelizes over output cells. The backward pass's
//! scatter-add into `grad_input` is a write hazard under parallel execution
//! (overlapping patches target the same slots), so each filter computes a
//! thread-local partial buffer and the buffers are merged by reduction —
//! the result is order-independent up to floating-point summation order.

use crate::init::WeightInitializer;
use crate::rng::RandomGenerator;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// Valid convolution layer with per-filter minibatch accumulators
pub struct Conv2D {
    input_height: usize,
    input_width: usize,
    input_depth: usize,
    filter_height: usize,
    filter_width: usize,
    vertical_stride: usize,
    horizontal_stride: usize,
    num_filters: usize,

    /// Filter bank; each filter is a [filter_height, filter_width, input_depth] cube
    pub filters: Vec<Tensor>,

    // Single-slot caches from the most recent forward/backward pair.
    input: Tensor,
    output: Tensor,
    grad_input: Tensor,
    grad_filters: Vec<Tensor>,

    // Per-minibatch accumulators; zero at batch start and after update.
    acc_grad_input: Tensor,
    acc_grad_filters: Vec<Tensor>,
}

impl Conv2D {
    /// Create a convolution layer with freshly initialized filters
    ///
    /// # Arguments
    ///
    /// * `input_height`, `input_width`, `input_depth` - Input cube shape
    /// * `filter_height`, `filter_width` - Spatial filter size (depth always
    ///   equals `input_depth`)
    /// * `vertical_stride`, `horizontal_stride` - Window step sizes
    /// * `num_filters` - Number of filters (= output depth)
    /// * `initializer` - Weight scheme name; fan-in is
    ///   `filter_height · filter_width · input_depth`
    /// * `rng` - Generator to draw the initial filter weights from
    ///
    /// # Panics
    ///
    /// Panics when the filter overhangs the input or the stride doesn't
    /// divide `(input - filter)` exactly on either axis — a valid
    /// convolution must tile the input, and coercing the shape would
    /// silently train a different network.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_height: usize,
        input_width: usize,
        input_depth: usize,
        filter_height: usize,
        filter_width: usize,
        vertical_stride: usize,
        horizontal_stride: usize,
        num_filters: usize,
        initializer: &str,
        rng: &mut RandomGenerator,
    ) -> Self {
        assert!(
            input_depth > 0 && num_filters > 0 && vertical_stride > 0 && horizontal_stride > 0,
            "Conv2D depth, filter count, and strides must be nonzero"
        );
        assert!(
            filter_height <= input_height && filter_width <= input_width,
            "Filter {}x{} doesn't fit input {}x{}",
            filter_height,
            filter_width,
            input_height,
            input_width
        );
        assert_eq!(
            (input_height - filter_height) % vertical_stride,
            0,
            "Vertical stride {} doesn't tile input height {} with filter height {}",
            vertical_stride,
            input_height,
            filter_height
        );
        assert_eq!(
            (input_width - filter_width) % horizontal_stride,
            0,
            "Horizontal stride {} doesn't tile input width {} with filter width {}",
            horizontal_stride,
            input_width,
            filter_width
        );

        let init = WeightInitializer::new(initializer, filter_height * filter_width * input_depth);
        let filters: Vec<Tensor> = (0..num_filters)
            .map(|_| {
                let data: Vec<f64> = (0..filter_height * filter_width * input_depth)
                    .map(|_| init.sample(rng))
                    .collect();
                Tensor::new(data, vec![filter_height, filter_width, input_depth])
            })
            .collect();

        let acc_grad_filters = (0..num_filters)
            .map(|_| Tensor::zeros(vec![filter_height, filter_width, input_depth]))
            .collect();

        Self {
            input_height,
            input_width,
            input_depth,
            filter_height,
            filter_width,
            vertical_stride,
            horizontal_stride,
            num_filters,
            filters,
            input: Tensor::empty(),
            output: Tensor::empty(),
            grad_input: Tensor::empty(),
            grad_filters: Vec::new(),
            acc_grad_input: Tensor::zeros(vec![input_height, input_width, input_depth]),
            acc_grad_filters,
        }
    }

    /// Spatial output height: `(input_height - filter_height)/vertical_stride + 1`
    pub fn output_height(&self) -> usize {
        (self.input_height - self.filter_height) / self.vertical_stride + 1
    }

    /// Spatial output width: `(input_width - filter_width)/horizontal_stride + 1`
    pub fn output_width(&self) -> usize {
        (self.input_width - self.filter_width) / self.horizontal_stride + 1
    }

    /// Output shape `[output_height, output_width, num_filters]`
    pub fn output_shape(&self) -> Vec<usize> {
        vec![self.output_height(), self.output_width(), self.num_filters]
    }

    /// Forward pass: one dot product per (output position, filter) pair
    ///
    /// Caches input and output for the backward pass.
    ///
    /// # Panics
    ///
    /// Panics if the input shape disagrees with the construction-time shape.
    pub fn forward(&mut self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape,
            vec![self.input_height, self.input_width, self.input_depth],
            "Conv2D input shape {:?} doesn't match configured shape [{}, {}, {}]",
            input.shape,
            self.input_height,
            self.input_width,
            self.input_depth
        );

        let out_h = self.output_height();
        let out_w = self.output_width();
        let nf = self.num_filters;
        let sv = self.vertical_stride;
        let sh = self.horizontal_stride;

        let mut out = vec![0.0; out_h * out_w * nf];
        // Each chunk is one (r, c) cell's filter vector; cells are independent
        out.par_chunks_mut(nf).enumerate().for_each(|(pos, cell)| {
            let r = pos / out_w;
            let c = pos % out_w;
            for (f, filter) in self.filters.iter().enumerate() {
                cell[f] = input.patch_dot(r * sv, c * sh, filter);
            }
        });

        let output = Tensor::new(out, vec![out_h, out_w, nf]);
        self.input = input.clone();
        self.output = output.clone();
        output
    }

    /// Backward pass: overlap-add input gradient, cross-correlation filter gradient
    ///
    /// Adds the per-sample filter gradients to the minibatch accumulators.
    ///
    /// # Panics
    ///
    /// Panics if the upstream gradient's shape disagrees with the last
    /// cached output (which also catches "backward before forward").
    pub fn backward(&mut self, upstream: &Tensor) {
        assert_eq!(
            upstream.shape, self.output.shape,
            "Upstream gradient shape {:?} doesn't match Conv2D output shape {:?}",
            upstream.shape, self.output.shape
        );

        let (ih, iw, id) = (self.input_height, self.input_width, self.input_depth);
        let (fh, fw) = (self.filter_height, self.filter_width);
        let (sv, sh) = (self.vertical_stride, self.horizontal_stride);
        let out_h = self.output_height();
        let out_w = self.output_width();
        let input_len = ih * iw * id;

        // grad_input: overlapping patches write the same slots, so each
        // filter fills a thread-local partial buffer and the buffers are
        // summed afterwards (order-independent up to fp summation order).
        let grad_input_data = (0..self.num_filters)
            .into_par_iter()
            .map(|f| {
                let filter = &self.filters[f];
                let mut partial = vec![0.0; input_len];
                for r in 0..out_h {
                    for c in 0..out_w {
                        let gval = upstream.at(r, c, f);
                        let (r0, c0) = (r * sv, c * sh);
                        for i in 0..fh {
                            for j in 0..fw {
                                let dst = ((r0 + i) * iw + (c0 + j)) * id;
                                let src = (i * fw + j) * id;
                                for k in 0..id {
                                    partial[dst + k] += gval * filter.data[src + k];
                                }
                            }
                        }
                    }
                }
                partial
            })
            .reduce(
                || vec![0.0; input_len],
                |mut acc, partial| {
                    acc.iter_mut().zip(partial).for_each(|(a, p)| *a += p);
                    acc
                },
            );
        self.grad_input = Tensor::new(grad_input_data, vec![ih, iw, id]);
        self.acc_grad_input.accumulate(&self.grad_input);

        // grad_filters[f] = Σ_{r,c} g[r][c][f] · (input patch); filters are
        // independent, so this fans out cleanly
        let input = &self.input;
        let grad_filters: Vec<Tensor> = (0..self.num_filters)
            .into_par_iter()
            .map(|f| {
                let mut gf = Tensor::zeros(vec![fh, fw, id]);
                for r in 0..out_h {
                    for c in 0..out_w {
                        let gval = upstream.at(r, c, f);
                        let (r0, c0) = (r * sv, c * sh);
                        for i in 0..fh {
                            for j in 0..fw {
                                let src = ((r0 + i) * iw + (c0 + j)) * id;
                                let dst = (i * fw + j) * id;
                                for k in 0..id {
                                    gf.data[dst + k] += gval * input.data[src + k];
                                }
                            }
                        }
                    }
                }
                gf
            })
            .collect();

        for (acc, gf) in self.acc_grad_filters.iter_mut().zip(&grad_filters) {
            acc.accumulate(gf);
        }
        self.grad_filters = grad_filters;
    }

    /// Apply the accumulated minibatch step to every filter and clear the
    /// accumulators
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn update_parameters(&mut self, batch_size: usize, learning_rate: f64) {
        assert!(batch_size > 0, "Batch size must be nonzero");
        let step = learning_rate / batch_size as f64;

        for (filter, acc) in self.filters.iter_mut().zip(&mut self.acc_grad_filters) {
            filter
                .data
                .iter_mut()
                .zip(&acc.data)
                .for_each(|(w, a)| *w -= step * a);
            acc.fill(0.0);
        }
        self.acc_grad_input.fill(0.0);
    }

    /// Gradient w.r.t. the last forward input (input-shaped cube)
    pub fn gradient_wrt_input(&self) -> &Tensor {
        &self.grad_input
    }

    /// Sum of per-sample input gradients since the last update
    pub fn accumulated_gradient_wrt_input(&self) -> &Tensor {
        &self.acc_grad_input
    }

    /// Per-sample filter gradients from the last backward
    pub fn gradient_wrt_filters(&self) -> &[Tensor] {
        &self.grad_filters
    }

    /// Number of filters (= output depth)
    pub fn num_filters(&self) -> usize {
        self.num_filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3x1 input counted 0..9, one 2x2x1 filter of ones, stride 1
    fn ones_filter_layer() -> Conv2D {
        let mut rng = RandomGenerator::from_seed(0);
        let mut layer = Conv2D::new(3, 3, 1, 2, 2, 1, 1, 1, "he", &mut rng);
        layer.filters[0] = Tensor::new(vec![1.0; 4], vec![2, 2, 1]);
        layer
    }

    fn counting_input() -> Tensor {
        Tensor::new((0..9).map(|i| i as f64).collect(), vec![3, 3, 1])
    }

    #[test]
    fn test_output_shape_law() {
        let mut rng = RandomGenerator::from_seed(0);
        // ((in - filter)/stride + 1) per spatial axis, depth = num_filters
        let cases = [
            (28, 28, 1, 5, 5, 1, 1, 6, [24, 24, 6]),
            (28, 28, 3, 4, 4, 2, 2, 8, [13, 13, 8]),
            (9, 6, 2, 3, 2, 3, 2, 4, [3, 3, 4]),
        ];
        for (ih, iw, id, fh, fw, sv, sh, nf, expected) in cases {
            let layer = Conv2D::new(ih, iw, id, fh, fw, sv, sh, nf, "he", &mut rng);
            assert_eq!(layer.output_shape(), expected.to_vec());
        }
    }

    #[test]
    #[should_panic(expected = "doesn't tile input height")]
    fn test_indivisible_stride_is_fatal() {
        let mut rng = RandomGenerator::from_seed(0);
        // (5 - 2) % 2 != 0
        Conv2D::new(5, 4, 1, 2, 2, 2, 2, 1, "he", &mut rng);
    }

    #[test]
    fn test_forward_window_sums() {
        let mut layer = ones_filter_layer();
        let out = layer.forward(&counting_input());

        // All-ones filter turns each 2x2 patch into its sum
        assert_eq!(out.shape, vec![2, 2, 1]);
        assert_eq!(out.data, vec![8.0, 12.0, 20.0, 24.0]);
    }

    #[test]
    fn test_backward_overlap_add_coverage() {
        let mut layer = ones_filter_layer();
        layer.forward(&counting_input());
        layer.backward(&Tensor::new(vec![1.0; 4], vec![2, 2, 1]));

        // With a ones filter and ones upstream, grad_input counts how many
        // windows cover each input cell
        let expected = vec![1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0];
        assert_eq!(layer.gradient_wrt_input().data, expected);
    }

    #[test]
    fn test_backward_filter_cross_correlation() {
        let mut layer = ones_filter_layer();
        layer.forward(&counting_input());
        layer.backward(&Tensor::new(vec![1.0; 4], vec![2, 2, 1]));

        // grad_filter[i][j] = Σ over the four window placements of the
        // input value at offset (i, j)
        let gf = &layer.gradient_wrt_filters()[0];
        assert_eq!(gf.data, vec![8.0, 12.0, 20.0, 24.0]);
    }

    #[test]
    fn test_upstream_gradient_scales_contributions() {
        let mut layer = ones_filter_layer();
        layer.forward(&counting_input());
        // Only the top-left output cell carries gradient
        layer.backward(&Tensor::new(vec![3.0, 0.0, 0.0, 0.0], vec![2, 2, 1]));

        let expected = vec![3.0, 3.0, 0.0, 3.0, 3.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(layer.gradient_wrt_input().data, expected);
    }

    #[test]
    fn test_accumulate_and_update_cycle() {
        let mut layer = ones_filter_layer();
        let g = Tensor::new(vec![1.0; 4], vec![2, 2, 1]);

        // Two identical samples, batch of 2: update must equal one
        // single-sample step
        layer.forward(&counting_input());
        layer.backward(&g);
        layer.forward(&counting_input());
        layer.backward(&g);
        layer.update_parameters(2, 0.1);

        let mut single = ones_filter_layer();
        single.forward(&counting_input());
        single.backward(&g);
        single.update_parameters(1, 0.1);

        for (a, b) in layer.filters[0].data.iter().zip(&single.filters[0].data) {
            assert!((a - b).abs() < 1e-12);
        }

        // Accumulators cleared: another update is a zero step
        let frozen = layer.filters[0].data.clone();
        layer.update_parameters(2, 0.1);
        assert_eq!(layer.filters[0].data, frozen);
    }

    #[test]
    fn test_input_gradient_accumulates_and_clears() {
        let mut layer = ones_filter_layer();
        let g = Tensor::new(vec![1.0; 4], vec![2, 2, 1]);

        layer.forward(&counting_input());
        layer.backward(&g);
        layer.forward(&counting_input());
        layer.backward(&g);

        // Twice the single-sample overlap-add coverage pattern
        let acc = layer.accumulated_gradient_wrt_input();
        assert_eq!(acc.data, vec![2.0, 4.0, 2.0, 4.0, 8.0, 4.0, 2.0, 4.0, 2.0]);

        layer.update_parameters(2, 0.1);
        assert!(layer
            .accumulated_gradient_wrt_input()
            .data
            .iter()
            .all(|&v| v == 0.0));
    }

    #[test]
    fn test_multi_filter_output_layout() {
        let mut rng = RandomGenerator::from_seed(0);
        let mut layer = Conv2D::new(2, 2, 1, 2, 2, 1, 1, 2, "he", &mut rng);
        layer.filters[0] = Tensor::new(vec![1.0, 0.0, 0.0, 0.0], vec![2, 2, 1]);
        layer.filters[1] = Tensor::new(vec![0.0, 0.0, 0.0, 1.0], vec![2, 2, 1]);

        let input = Tensor::new(vec![5.0, 6.0, 7.0, 8.0], vec![2, 2, 1]);
        let out = layer.forward(&input);

        // Single output position, depth 2: filter index is the innermost axis
        assert_eq!(out.shape, vec![1, 1, 2]);
        assert_eq!(out.data, vec![5.0, 8.0]);
    }

    #[test]
    #[should_panic(expected = "doesn't match Conv2D output shape")]
    fn test_backward_rejects_wrong_gradient_shape() {
        let mut layer = ones_filter_layer();
        layer.forward(&counting_input());
        layer.backward(&Tensor::new(vec![1.0; 9], vec![3, 3, 1]));
    }
}
