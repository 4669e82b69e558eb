//! Fixed-schedule training loop and accuracy evaluation.
//!
//! The schedule is the one from the classic tutorial: 1000 iterations, a
//! random batch of 100 samples each, learning rate 0.5. There is no early
//! stopping, no checkpointing, and no intermediate-loss reporting; the loop
//! runs to the end and leaves the trained parameters in the model.

use rand::Rng;

use crate::dataset::Split;
use crate::model::SoftmaxRegression;

/// Hyperparameters for one training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    /// Number of SGD steps to take.
    pub iterations: usize,
    /// Samples drawn per step.
    pub batch_size: usize,
    /// Fixed step size; no decay, no momentum.
    pub learning_rate: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            batch_size: 100,
            learning_rate: 0.5,
        }
    }
}

/// Trains the model in place on random batches from `split`.
///
/// Returns the loss of the final batch, mostly as a smoke signal for callers
/// that want one.
pub fn train<R: Rng + ?Sized>(
    model: &mut SoftmaxRegression,
    split: &Split,
    config: &TrainConfig,
    rng: &mut R,
) -> f64 {
    let mut last_loss = f64::NAN;
    for _ in 0..config.iterations {
        let (images, labels) = split.random_batch(rng, config.batch_size);
        last_loss = model.train_step(&images, &labels, config.learning_rate);
    }
    last_loss
}

/// Fraction of samples whose predicted class matches the label, in `[0, 1]`.
pub fn evaluate(model: &SoftmaxRegression, split: &Split) -> f64 {
    let predicted = model.predict(&split.images);
    let expected = split.labels.argmax_rows();

    let correct = predicted
        .iter()
        .zip(&expected)
        .filter(|(p, e)| p == e)
        .count();
    correct as f64 / split.len() as f64
}
