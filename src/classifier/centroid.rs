use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{Classifier, InputShape};
use crate::error::{Error, Result};

/// Nearest-centroid classifier backend: each label keeps one normalized
/// centroid of its training documents' mean-pooled embedding rows, and
/// prediction scores a document by cosine similarity against each centroid.
///
/// This is the crate's trainable reference backend; heavier architectures
/// are trained externally and loaded through the ONNX adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidClassifier {
    shape: InputShape,
    centroids: Vec<Vec<f32>>,
}

impl CentroidClassifier {
    pub fn new(shape: InputShape, output_width: usize) -> Self {
        Self {
            shape,
            centroids: vec![vec![0.0; shape.embedding_size]; output_width],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|_| Error::NotFound(format!("classifier file '{}'", path.display())))?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn check_input(&self, input: &Array3<f32>) -> Result<()> {
        let (_, length, width) = input.dim();
        if length != self.shape.sample_length || width != self.shape.embedding_size {
            return Err(Error::InvalidArgument(format!(
                "input tensor is ({length}, {width}) per document, classifier expects ({}, {})",
                self.shape.sample_length, self.shape.embedding_size
            )));
        }
        Ok(())
    }

    /// Mean over the word positions of one document's tensor rows.
    fn pool(rows: ArrayView2<f32>) -> Array1<f32> {
        rows.mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(rows.ncols()))
    }

    fn normalize(vector: &Array1<f32>) -> Array1<f32> {
        let norm: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
        if norm > 1e-10 {
            vector / norm
        } else {
            Array1::zeros(vector.len())
        }
    }
}

impl Classifier for CentroidClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn output_width(&self) -> usize {
        self.centroids.len()
    }

    fn predict(&self, input: &Array3<f32>) -> Result<Array2<f32>> {
        self.check_input(input)?;
        let rows = input.dim().0;
        let mut scores = Array2::zeros((rows, self.centroids.len()));
        for (row, doc) in input.axis_iter(Axis(0)).enumerate() {
            let pooled = Self::normalize(&Self::pool(doc));
            for (col, centroid) in self.centroids.iter().enumerate() {
                scores[[row, col]] = pooled
                    .iter()
                    .zip(centroid)
                    .map(|(a, b)| a * b)
                    .sum::<f32>();
            }
        }
        Ok(scores)
    }

    fn fit(&mut self, input: &Array3<f32>, targets: &Array2<f32>) -> Result<()> {
        self.check_input(input)?;
        let (rows, width) = targets.dim();
        if rows != input.dim().0 {
            return Err(Error::InvalidArgument(format!(
                "{} target rows for {} input documents",
                rows,
                input.dim().0
            )));
        }
        if width != self.centroids.len() {
            return Err(Error::InvalidArgument(format!(
                "{} target columns, classifier has {} outputs",
                width,
                self.centroids.len()
            )));
        }

        let mut sums = vec![Array1::<f32>::zeros(self.shape.embedding_size); width];
        let mut counts = vec![0usize; width];
        for (row, doc) in input.axis_iter(Axis(0)).enumerate() {
            let pooled = Self::normalize(&Self::pool(doc));
            for col in 0..width {
                if targets[[row, col]] > 0.0 {
                    sums[col] += &pooled;
                    counts[col] += 1;
                }
            }
        }

        for (col, sum) in sums.into_iter().enumerate() {
            if counts[col] > 0 {
                let mean = sum / counts[col] as f32;
                self.centroids[col] = Self::normalize(&mean).to_vec();
            }
        }
        Ok(())
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "centroid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_batch() -> (Array3<f32>, Array2<f32>) {
        // Two documents, two word positions, two embedding components.
        let input = array![
            [[1.0, 0.0], [1.0, 0.0]],
            [[0.0, 1.0], [0.0, 1.0]],
        ];
        let targets = array![[1.0, 0.0], [0.0, 1.0]];
        (input, targets)
    }

    #[test]
    fn fit_then_predict_separates_classes() {
        let (input, targets) = toy_batch();
        let mut classifier = CentroidClassifier::new(InputShape::new(2, 2), 2);
        classifier.fit(&input, &targets).unwrap();

        let scores = classifier.predict(&input).unwrap();
        assert!(scores[[0, 0]] > scores[[0, 1]]);
        assert!(scores[[1, 1]] > scores[[1, 0]]);
    }

    #[test]
    fn zero_tensor_scores_zero_everywhere() {
        let (input, targets) = toy_batch();
        let mut classifier = CentroidClassifier::new(InputShape::new(2, 2), 2);
        classifier.fit(&input, &targets).unwrap();

        let zero = Array3::zeros((1, 2, 2));
        let scores = classifier.predict(&zero).unwrap();
        assert_eq!(scores.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn wrong_shape_is_invalid_argument() {
        let classifier = CentroidClassifier::new(InputShape::new(2, 2), 2);
        let err = classifier.predict(&Array3::zeros((1, 3, 2))).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn weights_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.clf");
        let (input, targets) = toy_batch();
        let mut classifier = CentroidClassifier::new(InputShape::new(2, 2), 2);
        classifier.fit(&input, &targets).unwrap();
        classifier.save_weights(&path).unwrap();

        let loaded = CentroidClassifier::load(&path).unwrap();
        assert_eq!(
            loaded.predict(&input).unwrap(),
            classifier.predict(&input).unwrap()
        );
    }
}
