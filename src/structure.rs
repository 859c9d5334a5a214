use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{info, warn};
use ndarray::Array2;

use crate::config::ModelConfig;
use crate::document::Document;
use crate::error::{Error, Result};

/// Sub-directory holding the per-sample content/label file pairs.
pub const CONTENT_DIR: &str = "content";
/// Manifest file listing one label per line in discovery order.
pub const LABEL_MANIFEST: &str = "labels";

const CONTENT_EXT: &str = "txt";
const LABEL_EXT: &str = "lab";

/// A normalized on-disk training structure: a `content/` directory of
/// `<label>_<index>.txt` / `<label>_<index>.lab` pairs plus a label
/// manifest whose order fixes the classifier's output dimension order.
#[derive(Debug, Clone)]
pub struct TrainingStructure {
    root: PathBuf,
    labels: Vec<String>,
}

/// Rebuilds the training structure at `out_dir` from the configuration's
/// classification entries. Any previous structure at `out_dir` is removed
/// first; the rebuild is exclusive and not safe to run concurrently
/// against the same target.
pub fn build_structure(config: &ModelConfig, out_dir: &Path) -> Result<TrainingStructure> {
    if out_dir.exists() {
        warn!("removing previous training structure at {}", out_dir.display());
        fs::remove_dir_all(out_dir)?;
    }
    let content_dir = out_dir.join(CONTENT_DIR);
    fs::create_dir_all(&content_dir)?;

    let mut labels = Vec::with_capacity(config.classification.len());
    for entry in &config.classification {
        let raw_path = config.content_file(&entry.label)?;
        let raw = fs::File::open(&raw_path).map_err(|_| {
            Error::NotFound(format!(
                "classification content file '{}'",
                raw_path.display()
            ))
        })?;

        let mut index = 0;
        for line in BufReader::new(raw).lines() {
            let line = line?;
            let sample = line.trim();
            if sample.is_empty() {
                continue;
            }
            let stem = format!("{}_{}", entry.label, index);
            fs::write(
                content_dir.join(format!("{stem}.{CONTENT_EXT}")),
                sample,
            )?;
            fs::write(content_dir.join(format!("{stem}.{LABEL_EXT}")), &entry.label)?;
            index += 1;
        }
        info!("label '{}': {} samples", entry.label, index);
        labels.push(entry.label.clone());
    }

    fs::write(out_dir.join(LABEL_MANIFEST), labels.join("\n"))?;
    Ok(TrainingStructure {
        root: out_dir.to_path_buf(),
        labels,
    })
}

impl TrainingStructure {
    /// Opens an existing structure, re-reading the label manifest.
    pub fn open(root: &Path) -> Result<Self> {
        let manifest = root.join(LABEL_MANIFEST);
        let raw = fs::read_to_string(&manifest).map_err(|_| {
            Error::NotFound(format!("label manifest '{}'", manifest.display()))
        })?;
        let labels = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            labels,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All `(content, label)` file pairs, sorted by file stem so sample
    /// order is stable across runs.
    pub fn samples(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let content_dir = self.root.join(CONTENT_DIR);
        let mut stems = Vec::new();
        for entry in fs::read_dir(&content_dir).map_err(|_| {
            Error::NotFound(format!("content directory '{}'", content_dir.display()))
        })? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(CONTENT_EXT) {
                stems.push(path.with_extension(""));
            }
        }
        stems.sort();

        let mut pairs = Vec::with_capacity(stems.len());
        for stem in stems {
            let content = stem.with_extension(CONTENT_EXT);
            let label = stem.with_extension(LABEL_EXT);
            if !label.exists() {
                return Err(Error::NotFound(format!(
                    "label file '{}'",
                    label.display()
                )));
            }
            pairs.push((content, label));
        }
        Ok(pairs)
    }

    /// Loads every sample as a `Document` (ids assigned by sample order,
    /// matching batch-tensor rows) plus the multi-hot target matrix of
    /// shape `(samples, labels)` in manifest order.
    pub fn load_training_data(&self) -> Result<(Vec<Document>, Array2<f32>)> {
        let pairs = self.samples()?;
        let mut docs = Vec::with_capacity(pairs.len());
        let mut targets = Array2::zeros((pairs.len(), self.labels.len()));

        for (row, (content, label_file)) in pairs.iter().enumerate() {
            docs.push(Document::from_file(row, content)?);
            for label in fs::read_to_string(label_file)?.lines() {
                let label = label.trim();
                if label.is_empty() {
                    continue;
                }
                let col = self
                    .labels
                    .iter()
                    .position(|l| l == label)
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "label '{}' in '{}' is not in the manifest",
                            label,
                            label_file.display()
                        ))
                    })?;
                targets[[row, col]] = 1.0;
            }
        }
        Ok((docs, targets))
    }
}
