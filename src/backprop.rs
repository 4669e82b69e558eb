//! Differentiable operations with manual backward closures.
//!
//! Every op follows the same pattern:
//! 1. **Inputs** are references to `WithGrad<Ten64>` (or a plain `Ten64` for
//!    non-trainable targets).
//! 2. **Forward pass** computes an output eagerly.
//! 3. **Backward pass** is returned as a closure capturing the minimal cloned
//!    data needed to map `dL/d(out)` to input gradients.
//! 4. The caller accumulates those gradients into `WithGrad` wrappers and
//!    applies [`sgd`].
//!
//! Forward passes parallelize over rows with `rayon`. Ops **panic** on shape
//! mismatches; there is no shape inference.

use rayon::prelude::*;

use crate::tensors::{Ten64, Tensor, WithGrad};

/// Backward closure producing gradients for two inputs.
pub type FnToDoubleTen64 = dyn Fn(&Ten64) -> (Ten64, Ten64);
/// Backward closure mapping a scalar upstream gradient to a tensor gradient.
pub type FnF64Ten64 = dyn Fn(f64) -> Ten64;
/// Backward closure producing a gradient for a single input.
pub type FnTen64To = dyn Fn(&Ten64) -> Ten64;

/// Performs matrix multiplication of two 2-D tensors: `a` (m×k) · `b` (k×n).
///
/// # Returns
/// - `out`: Product tensor (m×n).
/// - `back`: Closure that given `dL/d(out)` returns `(dL/d(a), dL/d(b))`,
///   i.e. `grad · bᵀ` and `aᵀ · grad`.
///
/// # Panics
/// Panics if internal dimensions do not match (`a.shape[1] != b.shape[0]`).
pub fn matmul(a: &WithGrad<Ten64>, b: &WithGrad<Ten64>) -> (Ten64, Box<FnToDoubleTen64>) {
    let m = a.value.shape[0];
    let k = a.value.shape[1];
    let n = b.value.shape[1];
    assert_eq!(k, b.value.shape[0], "matmul shape mismatch");

    let a_data = &a.value.data;
    let b_data = &b.value.data;

    let mut out_data = vec![0.0; m * n];
    out_data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        for l in 0..k {
            let a_il = a_data[i * k + l];
            for (j, slot) in row.iter_mut().enumerate() {
                *slot += a_il * b_data[l * n + j];
            }
        }
    });

    let out = Tensor::new(vec![m, n], out_data);

    let a_val = a.value.clone();
    let b_val = b.value.clone();

    let back = move |grad: &Ten64| {
        assert_eq!(grad.shape, [m, n], "matmul backward shape mismatch");

        let mut da = vec![0.0; m * k];
        da.par_chunks_mut(k).enumerate().for_each(|(i, row)| {
            for (l, slot) in row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += grad.data[i * n + j] * b_val.data[l * n + j];
                }
                *slot = sum;
            }
        });

        let mut db = vec![0.0; k * n];
        db.par_chunks_mut(n).enumerate().for_each(|(l, row)| {
            for i in 0..m {
                let a_il = a_val.data[i * k + l];
                for (j, slot) in row.iter_mut().enumerate() {
                    *slot += a_il * grad.data[i * n + j];
                }
            }
        });

        (Tensor::new(vec![m, k], da), Tensor::new(vec![k, n], db))
    };

    (out, Box::new(back))
}

/// Adds a bias row vector `b` (n) to every row of `x` (m×n).
///
/// # Returns
/// - `out`: Tensor of shape (m×n).
/// - `back`: Closure that given `dL/d(out)` returns `(dL/d(x), dL/d(b))`; the
///   bias gradient is the column sum of the upstream gradient.
///
/// # Panics
/// Panics if `b` is not a rank-1 tensor of length `x.shape[1]`.
pub fn bias_add(x: &WithGrad<Ten64>, b: &WithGrad<Ten64>) -> (Ten64, Box<FnToDoubleTen64>) {
    let m = x.value.shape[0];
    let n = x.value.shape[1];
    assert_eq!(b.value.shape, [n], "bias_add shape mismatch");

    let b_data = &b.value.data;
    let mut out_data = vec![0.0; m * n];
    out_data
        .par_chunks_mut(n)
        .zip(x.value.data.par_chunks(n))
        .for_each(|(out_row, x_row)| {
            for j in 0..n {
                out_row[j] = x_row[j] + b_data[j];
            }
        });

    let out = Tensor::new(vec![m, n], out_data);

    let back = move |grad: &Ten64| {
        assert_eq!(grad.shape, [m, n], "bias_add backward shape mismatch");

        let mut db = vec![0.0; n];
        for row in grad.data.chunks_exact(n) {
            for (slot, &g) in db.iter_mut().zip(row) {
                *slot += g;
            }
        }

        (grad.clone(), Tensor::new(vec![n], db))
    };

    (out, Box::new(back))
}

/// Softmax along the last axis of a 2-D tensor.
///
/// Each row of logits becomes a probability distribution: entries are
/// non-negative and sum to 1. The row maximum is subtracted before
/// exponentiation so large logits cannot overflow.
///
/// # Returns
/// - `out`: Tensor of row distributions, same shape as the input.
/// - `back`: Closure applying the softmax Jacobian,
///   `dL/d(zⱼ) = yⱼ·(dL/d(yⱼ) − Σᵢ yᵢ·dL/d(yᵢ))` per row.
pub fn softmax(input: &WithGrad<Ten64>) -> (Ten64, Box<FnTen64To>) {
    let shape = input.value.shape.clone();
    let cols = *shape.last().expect("softmax on rank-0 tensor");

    let mut out_data = vec![0.0; input.value.data.len()];
    out_data
        .par_chunks_mut(cols)
        .zip(input.value.data.par_chunks(cols))
        .for_each(|(out_row, row)| {
            let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exp_sum: f64 = row.iter().map(|&z| (z - max_val).exp()).sum();
            for j in 0..cols {
                out_row[j] = (row[j] - max_val).exp() / exp_sum;
            }
        });

    let out = Tensor::new(shape.clone(), out_data);
    let out_clone = out.data.clone();

    let back = move |grad_output: &Ten64| {
        let mut grad = vec![0.0; grad_output.data.len()];
        grad.par_chunks_mut(cols)
            .zip(out_clone.par_chunks(cols))
            .zip(grad_output.data.par_chunks(cols))
            .for_each(|((g_row, y), dy)| {
                let dot: f64 = y.iter().zip(dy).map(|(&yi, &dyi)| yi * dyi).sum();
                for j in 0..cols {
                    g_row[j] = y[j] * (dy[j] - dot);
                }
            });
        Tensor::new(shape.clone(), grad)
    };

    (out, Box::new(back))
}

/// Cross-entropy loss over softmaxed logits, averaged across batch rows.
///
/// Fuses softmax with `−Σᵢ tᵢ·log(pᵢ)` so the backward pass collapses to the
/// numerically clean form `(softmax − target) / rows`. The targets are
/// expected to be one-hot rows.
///
/// # Returns
/// - Scalar loss.
/// - Closure mapping `dL/dloss` to a gradient tensor shaped like `logits`.
///
/// # Panics
/// Panics if shapes of `logits` and `target` differ.
pub fn cross_entropy_loss(logits: &WithGrad<Ten64>, target: &Ten64) -> (f64, Box<FnF64Ten64>) {
    assert_eq!(
        logits.value.shape, target.shape,
        "cross_entropy_loss shape mismatch"
    );
    let shape = logits.value.shape.clone();
    let cols = *shape.last().expect("cross_entropy_loss on rank-0 tensor");
    let rows = logits.value.data.len() / cols;

    let mut softmax = vec![0.0; logits.value.data.len()];
    softmax
        .par_chunks_mut(cols)
        .zip(logits.value.data.par_chunks(cols))
        .for_each(|(s_row, row)| {
            let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exp_sum: f64 = row.iter().map(|&z| (z - max_val).exp()).sum();
            for j in 0..cols {
                s_row[j] = (row[j] - max_val).exp() / exp_sum;
            }
        });

    let n_rows = rows as f64;
    let loss = softmax
        .par_chunks(cols)
        .zip(target.data.par_chunks(cols))
        .map(|(s_row, t_row)| {
            s_row
                .iter()
                .zip(t_row)
                .map(|(&s, &t)| -t * s.ln())
                .sum::<f64>()
        })
        .sum::<f64>()
        / n_rows;

    let target_data = target.data.clone();
    let back = move |grad_output: f64| {
        let grad: Vec<f64> = softmax
            .par_iter()
            .zip(&target_data)
            .map(|(&s, &t)| (s - t) * grad_output / n_rows)
            .collect();
        Tensor::new(shape.clone(), grad)
    };

    (loss, Box::new(back))
}

/// Performs one in-place stochastic gradient descent step.
///
/// Applies `param = param − learning_rate · gradient`, then zeros the stored
/// gradient so the next step starts clean.
pub fn sgd(w: &mut WithGrad<Ten64>, lr: f64) {
    for (param, grad) in w.value.data.iter_mut().zip(&w.grad.data) {
        *param -= lr * *grad;
    }
    for grad in &mut w.grad.data {
        *grad = 0.0;
    }
}
