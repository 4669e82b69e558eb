//! End-to-end softmax regression on MNIST.
//!
//! Downloads the dataset into `MNIST_data/` on first run, trains the
//! single-layer classifier for 1000 batches of 100, then reports accuracy on
//! the held-out test split.

use std::fs::{File, create_dir_all};
use std::io::copy;
use std::path::Path;

use flate2::read::GzDecoder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::blocking::get;

use softreg::dataset::Mnist;
use softreg::model::SoftmaxRegression;
use softreg::train::{TrainConfig, evaluate, train};

const DATA_DIR: &str = "MNIST_data";
const MIRROR: &str = "https://storage.googleapis.com/cvdf-datasets/mnist";
const FILES: [&str; 4] = [
    "train-images-idx3-ubyte",
    "train-labels-idx1-ubyte",
    "t10k-images-idx3-ubyte",
    "t10k-labels-idx1-ubyte",
];

fn download_and_extract(url: &str, output_path: &Path) {
    let resp = get(url).expect("Failed to fetch URL");
    if !resp.status().is_success() {
        panic!("Failed to download {}: HTTP {}", url, resp.status());
    }

    let mut decoder = GzDecoder::new(resp);
    let mut out = File::create(output_path).expect("Failed to create file");
    copy(&mut decoder, &mut out).expect("Failed to decompress");
}

fn main() {
    create_dir_all(DATA_DIR).unwrap();
    for name in FILES {
        let path = Path::new(DATA_DIR).join(name);
        if !path.exists() {
            println!("Downloading {name}...");
            download_and_extract(&format!("{MIRROR}/{name}.gz"), &path);
        }
    }

    let mnist = Mnist::load(DATA_DIR).expect("Failed to load MNIST");

    let mut model = SoftmaxRegression::new();
    let mut rng = StdRng::seed_from_u64(42);
    train(&mut model, &mnist.train, &TrainConfig::default(), &mut rng);

    let accuracy = evaluate(&model, &mnist.test);
    println!("Accuracy of training data: {}%", accuracy * 100.0);
}
