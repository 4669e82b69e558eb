//! softreg: softmax regression on MNIST, built on a minimal autodiff core.
//!
//! Implements the classic single-layer digit classifier: raw pixel vectors are
//! multiplied by a weight matrix, shifted by a bias, squashed through softmax,
//! and trained with plain stochastic gradient descent against a cross-entropy
//! loss. Every differentiable operation is written by hand as a forward pass
//! plus a backward closure, so the whole training path is visible in one place.
//!
//! # Modules
//!
//! - [`tensors`] — Core tensor data structure and gradient wrapper.
//! - [`backprop`] — Differentiable operations with manual backward closures.
//! - [`model`] — The softmax regression model itself.
//! - [`dataset`] — MNIST IDX file parsing and random batch sampling.
//! - [`train`] — Fixed-schedule training loop and accuracy evaluation.
//!
//! # Example
//!
//! ```rust
//! use softreg::model::SoftmaxRegression;
//! use softreg::tensors::Tensor;
//!
//! let model = SoftmaxRegression::new();
//! let probs = model.forward(&Tensor::new(vec![1, 784], vec![0.0; 784]));
//! // All weights start at zero, so every class is equally likely.
//! assert!((probs.data[0] - 0.1).abs() < 1e-12);
//! ```

pub mod tensors;
pub mod backprop;
pub mod model;
pub mod dataset;
pub mod train;
