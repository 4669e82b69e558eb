//! MNIST IDX file parsing and random batch sampling.
//!
//! The dataset directory is expected to hold the four canonical decompressed
//! IDX files (`train-images-idx3-ubyte`, `train-labels-idx1-ubyte`,
//! `t10k-images-idx3-ubyte`, `t10k-labels-idx1-ubyte`). Pixels are normalized
//! from `u8` to `[0, 1]` and labels are expanded to one-hot rows of length 10.
//!
//! Loading is fully eager: both splits end up as flat `f64` buffers in memory
//! and are treated as read-only afterwards. Malformed files surface as
//! `io::ErrorKind::InvalidData` rather than panics.

use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use rand::seq::index::sample;

use crate::model::{INPUT_DIM, NUM_CLASSES};
use crate::tensors::{Ten64, Tensor};

const IMAGE_MAGIC: [u8; 4] = [0, 0, 8, 3];
const LABEL_MAGIC: [u8; 4] = [0, 0, 8, 1];

/// One split of the dataset: images `[n, 784]` paired with one-hot labels
/// `[n, 10]`.
#[derive(Debug, Clone)]
pub struct Split {
    pub images: Ten64,
    pub labels: Ten64,
}

impl Split {
    /// Number of samples in the split.
    pub fn len(&self) -> usize {
        self.images.shape[0]
    }

    /// Whether the split holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draws a random batch of `size` samples.
    ///
    /// Indices are distinct within one batch but drawn with replacement
    /// across calls, so samples repeat over the course of a training run.
    ///
    /// # Panics
    /// Panics if `size` exceeds the split length.
    pub fn random_batch<R: Rng + ?Sized>(&self, rng: &mut R, size: usize) -> (Ten64, Ten64) {
        assert!(size <= self.len(), "batch larger than split");
        let dim = self.images.shape[1];
        let classes = self.labels.shape[1];

        let mut images = Vec::with_capacity(size * dim);
        let mut labels = Vec::with_capacity(size * classes);
        for idx in sample(rng, self.len(), size) {
            images.extend_from_slice(&self.images.data[idx * dim..(idx + 1) * dim]);
            labels.extend_from_slice(&self.labels.data[idx * classes..(idx + 1) * classes]);
        }

        (
            Tensor::new(vec![size, dim], images),
            Tensor::new(vec![size, classes], labels),
        )
    }
}

/// The full dataset: a training split and a held-out test split.
#[derive(Debug, Clone)]
pub struct Mnist {
    pub train: Split,
    pub test: Split,
}

impl Mnist {
    /// Loads both splits from a directory of decompressed IDX files.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let dir = dir.as_ref();
        Ok(Self {
            train: load_split(
                &dir.join("train-images-idx3-ubyte"),
                &dir.join("train-labels-idx1-ubyte"),
            )?,
            test: load_split(
                &dir.join("t10k-images-idx3-ubyte"),
                &dir.join("t10k-labels-idx1-ubyte"),
            )?,
        })
    }
}

/// Loads one image/label file pair into a [`Split`].
pub fn load_split(images_path: &Path, labels_path: &Path) -> Result<Split, Box<dyn Error>> {
    let images = parse_images(&fs::read(images_path)?)?;
    let labels = parse_labels(&fs::read(labels_path)?)?;
    if images.shape[0] != labels.shape[0] {
        return Err(invalid_data(format!(
            "{} images but {} labels",
            images.shape[0], labels.shape[0]
        )));
    }
    Ok(Split { images, labels })
}

fn parse_images(buf: &[u8]) -> Result<Ten64, Box<dyn Error>> {
    if buf.len() < 16 || buf[0..4] != IMAGE_MAGIC {
        return Err(invalid_data("bad IDX image magic".into()));
    }
    let count = u32::from_be_bytes(buf[4..8].try_into()?) as usize;
    let rows = u32::from_be_bytes(buf[8..12].try_into()?) as usize;
    let cols = u32::from_be_bytes(buf[12..16].try_into()?) as usize;
    if rows * cols != INPUT_DIM {
        return Err(invalid_data(format!(
            "expected 28x28 images, got {rows}x{cols}"
        )));
    }
    let pixels = &buf[16..];
    if pixels.len() != count * INPUT_DIM {
        return Err(invalid_data("truncated IDX image file".into()));
    }

    let data: Vec<f64> = pixels.iter().map(|&b| f64::from(b) / 255.0).collect();
    Ok(Tensor::new(vec![count, INPUT_DIM], data))
}

fn parse_labels(buf: &[u8]) -> Result<Ten64, Box<dyn Error>> {
    if buf.len() < 8 || buf[0..4] != LABEL_MAGIC {
        return Err(invalid_data("bad IDX label magic".into()));
    }
    let count = u32::from_be_bytes(buf[4..8].try_into()?) as usize;
    let raw = &buf[8..];
    if raw.len() != count {
        return Err(invalid_data("truncated IDX label file".into()));
    }

    let mut data = vec![0.0; count * NUM_CLASSES];
    for (i, &label) in raw.iter().enumerate() {
        let class = label as usize;
        if class >= NUM_CLASSES {
            return Err(invalid_data(format!("label {label} out of range")));
        }
        data[i * NUM_CLASSES + class] = 1.0;
    }
    Ok(Tensor::new(vec![count, NUM_CLASSES], data))
}

fn invalid_data(msg: String) -> Box<dyn Error> {
    Box::new(io::Error::new(io::ErrorKind::InvalidData, msg))
}
