//! Core tensor data structure and gradient wrapper.
//!
//! Tensors are N-dimensional in principle, but everything this crate trains is
//! rank 1 or 2: pixel batches `[n, 784]`, the weight matrix `[784, 10]`, the
//! bias `[10]`, and probability batches `[n, 10]`.
//!
//! ## Design Highlights
//! - `shape` is a `Vec<usize>` checked at construction; `data` is flat,
//!   row-major.
//! - `WithGrad<T>` pairs a value with a same-shaped gradient buffer for the
//!   manual autograd in [`crate::backprop`].
//! - The `tensor!` macro builds small tensors from nested literals, mostly for
//!   tests.
//!
//! ## Limitations
//! - Row-major only; no slicing, no shape inference, and no broadcasting
//!   beyond the dedicated `bias_add` op.

/// An N-dimensional tensor with a shape and flat row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

/// The element type used throughout training.
pub type Ten64 = Tensor<f64>;

impl<T> Tensor<T> {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape
    /// product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }
}

impl Ten64 {
    /// Creates an all-zero tensor of the given shape.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Index of the largest value in each row of a 2-D tensor.
    ///
    /// Ties resolve to the lowest index, which matches how one-hot labels are
    /// read back out.
    ///
    /// # Panics
    /// Panics if the tensor is not rank 2.
    pub fn argmax_rows(&self) -> Vec<usize> {
        assert_eq!(self.shape.len(), 2, "argmax_rows needs a 2-D tensor");
        let cols = self.shape[1];
        self.data
            .chunks_exact(cols)
            .map(|row| {
                let mut best = 0;
                for (j, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }
}

/// A container for tracking gradients of values (used in autograd).
///
/// Typically used as `WithGrad<Ten64>`; the gradient always has the same shape
/// as the value.
#[derive(Debug, Clone)]
pub struct WithGrad<T> {
    pub value: T,
    pub grad: T,
}

impl WithGrad<Ten64> {
    /// Wraps a tensor with a zeroed gradient of the same shape.
    pub fn new(value: Ten64) -> Self {
        let grad = Ten64::zeros(value.shape.clone());
        Self { value, grad }
    }

    /// Adds `delta` into the stored gradient.
    ///
    /// # Panics
    /// Panics if shapes do not match.
    pub fn accumulate(&mut self, delta: &Ten64) {
        assert_eq!(self.grad.shape, delta.shape, "gradient shape mismatch");
        for (g, d) in self.grad.data.iter_mut().zip(&delta.data) {
            *g += d;
        }
    }
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use softreg::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($lit:literal) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };

    ([ $( $inner:tt ),+ $(,)? ]) => {{
        let children = vec![ $( tensor!($inner) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};

    // Fallback for rows whose elements span multiple token trees (e.g. the
    // negative literal `-5.0`, which is a `-` token followed by `5.0`).
    ([ $( $inner:expr ),+ $(,)? ]) => {{
        let children = vec![ $( tensor!($inner) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};

    ($e:expr) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$e])
    };
}
