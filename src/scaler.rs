use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capability interface over the vector normalizer sitting between raw
/// embedding lookups and tensor assembly.
pub trait VectorScaler {
    /// Normalizes one raw embedding vector.
    fn transform(&self, vector: &[f32]) -> Vec<f32>;
}

/// Per-component zero-mean/unit-variance scaler, the scaler artifact of a
/// model cluster. Fitted once over the training corpus's word vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl StandardScaler {
    /// Fits mean and standard deviation over `rows`. Fails
    /// `InvalidArgument` on an empty or ragged collection.
    pub fn fit<'a>(rows: impl IntoIterator<Item = &'a [f32]>) -> Result<Self> {
        let mut count = 0usize;
        let mut mean: Vec<f64> = Vec::new();
        let mut m2: Vec<f64> = Vec::new();

        // Welford's online update keeps a single pass over the rows.
        for row in rows {
            if count == 0 {
                mean = vec![0.0; row.len()];
                m2 = vec![0.0; row.len()];
            } else if row.len() != mean.len() {
                return Err(Error::InvalidArgument(format!(
                    "scaler fit row has dimension {}, expected {}",
                    row.len(),
                    mean.len()
                )));
            }
            count += 1;
            for (i, &x) in row.iter().enumerate() {
                let delta = x as f64 - mean[i];
                mean[i] += delta / count as f64;
                m2[i] += delta * (x as f64 - mean[i]);
            }
        }

        if count == 0 {
            return Err(Error::InvalidArgument(
                "cannot fit a scaler on zero vectors".into(),
            ));
        }

        let std = m2
            .iter()
            .map(|&s| (s / count as f64).sqrt() as f32)
            .collect();
        Ok(Self {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        })
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|_| Error::NotFound(format!("scaler file '{}'", path.display())))?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

impl VectorScaler for StandardScaler {
    fn transform(&self, vector: &[f32]) -> Vec<f32> {
        vector
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&mean, &std))| {
                // Zero-variance components pass through centered.
                if std > 0.0 {
                    (x - mean) / std
                } else {
                    x - mean
                }
            })
            .collect()
    }
}

/// Identity scaler for pipelines whose embeddings are already normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityScaler;

impl VectorScaler for IdentityScaler {
    fn transform(&self, vector: &[f32]) -> Vec<f32> {
        vector.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_centers_and_scales() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(rows.iter().map(Vec::as_slice)).unwrap();
        let scaled = scaler.transform(&[1.0, 10.0]);
        assert!((scaled[0] + 1.0).abs() < 1e-6);
        // Second component has zero variance: centered only.
        assert_eq!(scaled[1], 0.0);
    }

    #[test]
    fn empty_fit_is_invalid() {
        let err = StandardScaler::fit(std::iter::empty()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn ragged_rows_are_invalid() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![1.0]];
        let err = StandardScaler::fit(rows.iter().map(Vec::as_slice)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.scl");
        let rows: Vec<Vec<f32>> = vec![vec![0.0, 1.0], vec![2.0, 3.0]];
        let scaler = StandardScaler::fit(rows.iter().map(Vec::as_slice)).unwrap();
        scaler.save(&path).unwrap();
        let loaded = StandardScaler::load(&path).unwrap();
        assert_eq!(loaded.transform(&[1.0, 2.0]), scaler.transform(&[1.0, 2.0]));
    }
}
