mod centroid;
mod onnx;

pub use centroid::CentroidClassifier;
pub use onnx::OnnxClassifier;

use std::path::Path;

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The fixed input geometry a classifier was built for: how many word
/// positions per document and how wide each embedding row is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub sample_length: usize,
    pub embedding_size: usize,
}

impl InputShape {
    pub fn new(sample_length: usize, embedding_size: usize) -> Self {
        Self {
            sample_length,
            embedding_size,
        }
    }
}

/// Capability interface over the neural classifier backend.
///
/// The backend owns all of the numeric heavy lifting; this crate only
/// hands it tensors of its declared shape and interprets the score vector
/// it returns. Score positions map to labels by the cluster's label order.
pub trait Classifier {
    /// Declared per-document input shape.
    fn input_shape(&self) -> InputShape;

    /// Number of named input slots. Multi-input architectures receive the
    /// same assembled tensor once per slot.
    fn input_slots(&self) -> usize {
        1
    }

    /// Number of score positions produced per document.
    fn output_width(&self) -> usize;

    /// Scores one assembled batch; returns one score vector per batch row
    /// as `(rows, output_width)`.
    fn predict(&self, input: &Array3<f32>) -> Result<Array2<f32>>;

    /// Fits the backend on an assembled batch and its multi-hot targets.
    /// Inference-only backends reject this.
    fn fit(&mut self, input: &Array3<f32>, targets: &Array2<f32>) -> Result<()>;

    /// Persists the backend's weights via its own serialization.
    fn save_weights(&self, path: &Path) -> Result<()>;

    /// Stable identifier written to the cluster manifest so `load` can
    /// reconstruct the right backend.
    fn kind(&self) -> &'static str;
}
