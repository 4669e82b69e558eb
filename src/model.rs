//! The softmax regression model.
//!
//! A single linear layer: 784 flattened pixels in, 10 digit scores out,
//! softmax on top. Both parameters start at zero, which makes the untrained
//! model predict the uniform distribution.

use crate::backprop::{bias_add, cross_entropy_loss, matmul, sgd, softmax};
use crate::tensors::{Ten64, WithGrad};

/// Number of pixels in a flattened 28×28 MNIST image.
pub const INPUT_DIM: usize = 784;
/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Single-layer softmax classifier with trainable weights and bias.
///
/// Parameters are owned exclusively by the model and mutated in place by
/// [`train_step`](SoftmaxRegression::train_step); their shapes never change
/// after construction.
#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    pub weights: WithGrad<Ten64>,
    pub bias: WithGrad<Ten64>,
}

impl SoftmaxRegression {
    /// Creates a model with all-zero weights `[784, 10]` and bias `[10]`.
    pub fn new() -> Self {
        Self {
            weights: WithGrad::new(Ten64::zeros(vec![INPUT_DIM, NUM_CLASSES])),
            bias: WithGrad::new(Ten64::zeros(vec![NUM_CLASSES])),
        }
    }

    /// Raw class scores `x · W + b` for a batch of inputs `[n, 784]`.
    ///
    /// # Panics
    /// Panics if `inputs` is not shaped `[n, 784]`.
    pub fn logits(&self, inputs: &Ten64) -> Ten64 {
        let x = WithGrad::new(inputs.clone());
        let (scores, _) = matmul(&x, &self.weights);
        let (logits, _) = bias_add(&WithGrad::new(scores), &self.bias);
        logits
    }

    /// Class probability distributions for a batch of inputs `[n, 784]`.
    ///
    /// Each output row is non-negative and sums to 1.
    pub fn forward(&self, inputs: &Ten64) -> Ten64 {
        let (probs, _) = softmax(&WithGrad::new(self.logits(inputs)));
        probs
    }

    /// Most likely class index for each input row.
    pub fn predict(&self, inputs: &Ten64) -> Vec<usize> {
        // Softmax is monotone, so the argmax can be read off the raw scores.
        self.logits(inputs).argmax_rows()
    }

    /// Runs one SGD step on a batch and returns the batch loss.
    ///
    /// Forward: logits through the fused softmax cross-entropy. Backward:
    /// chain the closures in reverse, accumulate into the parameter
    /// gradients, and apply the update. The input gradient is computed but
    /// discarded, since pixels are not trainable.
    ///
    /// # Panics
    /// Panics if `images` is not `[n, 784]` or `labels` is not `[n, 10]`.
    pub fn train_step(&mut self, images: &Ten64, labels: &Ten64, learning_rate: f64) -> f64 {
        let x = WithGrad::new(images.clone());
        let (scores, back_matmul) = matmul(&x, &self.weights);
        let scores = WithGrad::new(scores);
        let (logits, back_bias) = bias_add(&scores, &self.bias);
        let logits = WithGrad::new(logits);
        let (loss, back_loss) = cross_entropy_loss(&logits, labels);

        let d_logits = back_loss(1.0);
        let (d_scores, d_bias) = back_bias(&d_logits);
        let (_d_inputs, d_weights) = back_matmul(&d_scores);

        self.weights.accumulate(&d_weights);
        self.bias.accumulate(&d_bias);
        sgd(&mut self.weights, learning_rate);
        sgd(&mut self.bias, learning_rate);

        loss
    }
}

impl Default for SoftmaxRegression {
    fn default() -> Self {
        Self::new()
    }
}
