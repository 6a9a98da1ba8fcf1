//! Tensor Storage for Layer Computations
//!
//! This module provides a minimal tensor container for the training engine.
//! Tensors store multi-dimensional arrays with shape and stride information
//! for efficient indexing and memory layout.
//!
//! ## Core Concepts
//!
//! - **Data**: Flat `Vec<f64>` storing all elements in row-major order
//! - **Shape**: Dimensions of the tensor (e.g., `[height, width, depth]`)
//! - **Strides**: Step sizes for each dimension to compute flat indices
//!
//! The engine only ever needs two shapes: 1-D vectors (dense layers, losses,
//! vector activations) and 3-D cubes of `height × width × depth` (convolution,
//! pooling, cube activations). The container itself is shape-generic; the
//! layers assert the ranks they require.
//!
//! ## Example
//!
//! ```rust
//! use cesario::Tensor;
//!
//! // A 2x2x1 cube
//! let cube = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2, 1]);
//! assert_eq!(cube.at(1, 0, 0), 3.0);
//!
//! // A plain vector
//! let v = Tensor::vector(vec![1.0, -1.0]);
//! assert_eq!(v.dot(&v), 2.0);
//! ```
//!
//! ## Performance
//!
//! Element-wise operations use parallel iteration via Rayon. Window products
//! (`patch_dot`) stay sequential: they are the innermost loop of convolution,
//! which parallelizes at the output-cell level instead.

use rayon::prelude::*;

/// A multi-dimensional array of 64-bit floats
///
/// Tensors store data in a contiguous `Vec<f64>` with shape and stride
/// information for multi-dimensional indexing. All operations use row-major
/// (C-style) memory layout.
///
/// # Memory Layout
///
/// For shape `[h, w, d]`, element `(r, c, k)` lives at flat index
/// `r*w*d + c*d + k`: depth is the innermost (fastest-varying) dimension.
#[derive(Clone, Debug)]
pub struct Tensor {
    /// Flat storage of all tensor elements
    pub data: Vec<f64>,
    /// Shape of the tensor (dimensions)
    pub shape: Vec<usize>,
    /// Strides for each dimension (computed from shape)
    pub strides: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor with given data and shape
    ///
    /// # Panics
    ///
    /// Panics if the product of shape dimensions doesn't equal data length
    ///
    /// # Example
    ///
    /// ```rust
    /// # use cesario::Tensor;
    /// let tensor = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    /// assert_eq!(tensor.shape, vec![2, 2]);
    /// ```
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Self {
        let expected_size: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_size,
            "Data length ({}) doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_size
        );

        let strides = Self::compute_strides(&shape);
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Create a tensor filled with zeros
    ///
    /// # Example
    ///
    /// ```rust
    /// # use cesario::Tensor;
    /// let tensor = Tensor::zeros(vec![3, 4, 2]);
    /// assert_eq!(tensor.data.len(), 24);
    /// assert!(tensor.data.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        let data = vec![0.0; size];
        Self::new(data, shape)
    }

    /// Create a 1-D tensor from a plain vector of values
    pub fn vector(data: Vec<f64>) -> Self {
        let len = data.len();
        Self::new(data, vec![len])
    }

    /// Create an empty placeholder tensor
    ///
    /// Layers use this for caches that have not been filled by a forward
    /// pass yet; any shape-checked operation against it fails loudly.
    pub fn empty() -> Self {
        Self::new(Vec::new(), vec![0])
    }

    /// Compute strides from shape (row-major layout)
    ///
    /// For shape `[d0, d1, d2]`, strides are `[d1*d2, d2, 1]`
    fn compute_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read element `(row, col, slice)` of a 3-D tensor
    ///
    /// # Panics
    ///
    /// Panics if the tensor is not 3-D or the index is out of bounds.
    #[inline]
    pub fn at(&self, row: usize, col: usize, slice: usize) -> f64 {
        debug_assert_eq!(self.shape.len(), 3, "at() requires a 3-D tensor");
        self.data[row * self.strides[0] + col * self.strides[1] + slice]
    }

    /// Mutable access to element `(row, col, slice)` of a 3-D tensor
    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize, slice: usize) -> &mut f64 {
        debug_assert_eq!(self.shape.len(), 3, "at_mut() requires a 3-D tensor");
        let idx = row * self.strides[0] + col * self.strides[1] + slice;
        &mut self.data[idx]
    }

    /// Dot product of two tensors of identical element count
    ///
    /// Both tensors are treated as flat vectors, so a cube can be dotted
    /// against a cube of the same shape (this is exactly the per-window
    /// product convolution needs).
    ///
    /// # Example
    ///
    /// ```rust
    /// # use cesario::Tensor;
    /// let a = Tensor::vector(vec![1.0, 2.0, 3.0]);
    /// let b = Tensor::vector(vec![4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b), 32.0);
    /// ```
    pub fn dot(&self, other: &Tensor) -> f64 {
        assert_eq!(
            self.data.len(),
            other.data.len(),
            "Element counts must match for dot product: {:?} vs {:?}",
            self.shape,
            other.shape
        );
        self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum()
    }

    /// Dot product of one filter-shaped window of `self` against `window`
    ///
    /// `self` must be a 3-D tensor and `window` a 3-D tensor of the same
    /// depth. The window's top-left corner is placed at `(row0, col0)` and
    /// the products run over the window's full height × width × depth.
    ///
    /// # Panics
    ///
    /// Panics if depths differ or the window overhangs the tensor bounds.
    pub fn patch_dot(&self, row0: usize, col0: usize, window: &Tensor) -> f64 {
        assert_eq!(self.shape.len(), 3, "patch_dot() requires a 3-D tensor");
        assert_eq!(window.shape.len(), 3, "patch_dot() window must be 3-D");
        assert_eq!(
            self.shape[2], window.shape[2],
            "Window depth ({}) must match tensor depth ({})",
            window.shape[2], self.shape[2]
        );
        assert!(
            row0 + window.shape[0] <= self.shape[0] && col0 + window.shape[1] <= self.shape[1],
            "Window {:?} at ({}, {}) overhangs tensor {:?}",
            window.shape,
            row0,
            col0,
            self.shape
        );

        let depth = self.shape[2];
        let mut sum = 0.0;
        for i in 0..window.shape[0] {
            for j in 0..window.shape[1] {
                let src = (row0 + i) * self.strides[0] + (col0 + j) * depth;
                let dst = i * window.strides[0] + j * depth;
                for k in 0..depth {
                    sum += self.data[src + k] * window.data[dst + k];
                }
            }
        }
        sum
    }

    /// Element-wise addition
    ///
    /// # Panics
    ///
    /// Panics if shapes differ. There is no broadcasting anywhere in this
    /// engine: every gradient must arrive exactly output-shaped.
    pub fn add(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape, other.shape,
            "Shapes must match for addition: {:?} vs {:?}",
            self.shape, other.shape
        );
        let result = self
            .data
            .par_iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Element-wise subtraction
    pub fn sub(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape, other.shape,
            "Shapes must match for subtraction: {:?} vs {:?}",
            self.shape, other.shape
        );
        let result = self
            .data
            .par_iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Element-wise (Hadamard) product
    pub fn hadamard(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape, other.shape,
            "Shapes must match for element-wise product: {:?} vs {:?}",
            self.shape, other.shape
        );
        let result = self
            .data
            .par_iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Accumulate `other` into `self` element-wise
    ///
    /// Used by the per-minibatch gradient accumulators.
    pub fn accumulate(&mut self, other: &Tensor) {
        assert_eq!(
            self.shape, other.shape,
            "Shapes must match for accumulation: {:?} vs {:?}",
            self.shape, other.shape
        );
        self.data
            .iter_mut()
            .zip(&other.data)
            .for_each(|(a, b)| *a += b);
    }

    /// Multiply all elements by a scalar
    pub fn scale(&self, scalar: f64) -> Tensor {
        let result = self.data.par_iter().map(|&x| x * scalar).collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Apply a function element-wise
    pub fn map<F>(&self, f: F) -> Tensor
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let result = self.data.par_iter().map(|&x| f(x)).collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Set every element to `value`
    ///
    /// `fill(0.0)` is how accumulators are cleared after a parameter update.
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Reshape to a new shape with the same element count
    ///
    /// # Example
    ///
    /// ```rust
    /// # use cesario::Tensor;
    /// let cube = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2, 1]);
    /// let flat = cube.reshape(&[4]);
    /// assert_eq!(flat.shape, vec![4]);
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> Tensor {
        let new_size: usize = new_shape.iter().product();
        assert_eq!(
            self.data.len(),
            new_size,
            "Cannot reshape {:?} to {:?}: element count mismatch",
            self.shape,
            new_shape
        );
        Tensor::new(self.data.clone(), new_shape.to_vec())
    }

    /// Flatten to a 1-D tensor (row-major order)
    pub fn flatten(&self) -> Tensor {
        self.reshape(&[self.data.len()])
    }

    /// Index of the largest element (first occurrence on ties)
    ///
    /// # Panics
    ///
    /// Panics if the tensor is empty.
    pub fn argmax(&self) -> usize {
        assert!(!self.data.is_empty(), "argmax of an empty tensor");
        let mut best = 0;
        for (i, &v) in self.data.iter().enumerate() {
            if v > self.data[best] {
                best = i;
            }
        }
        best
    }

    /// Largest element value
    pub fn max(&self) -> f64 {
        assert!(!self.data.is_empty(), "max of an empty tensor");
        self.data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }
}
