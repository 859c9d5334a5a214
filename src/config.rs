use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Well-known configuration file name inside a model source directory.
pub const CONFIG_FILE: &str = "model.json";

/// Descriptive metadata for the model being trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
}

/// Knobs forwarded to the external training collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProperties {
    pub epoch: usize,
    pub vec_dim: usize,
    pub test_ratio: f32,
    pub architecture: String,
    pub batch_size: usize,
}

/// One label and the raw content file holding its samples, one per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub label: String,
    pub file: String,
}

/// The `model.json` document describing a model source directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelSection,
    pub training_properties: TrainingProperties,
    pub classification: Vec<ClassificationEntry>,
    #[serde(skip)]
    src_dir: PathBuf,
}

impl ModelConfig {
    /// Reads `model.json` from `src_dir`.
    pub fn load(src_dir: &Path) -> Result<Self> {
        if !src_dir.exists() {
            return Err(Error::NotFound(format!(
                "source directory '{}'",
                src_dir.display()
            )));
        }
        let config_path = src_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(Error::NotFound(format!(
                "'{}' in source directory '{}'",
                CONFIG_FILE,
                src_dir.display()
            )));
        }
        let raw = fs::read_to_string(&config_path)?;
        let mut config: ModelConfig = serde_json::from_str(&raw)?;
        config.src_dir = src_dir.to_path_buf();
        Ok(config)
    }

    /// Labels in declaration order. This order is what the training
    /// structure's manifest, and therefore the classifier output, follows.
    pub fn labels(&self) -> Vec<&str> {
        self.classification.iter().map(|c| c.label.as_str()).collect()
    }

    /// Absolute path of the raw content file for `label`.
    pub fn content_file(&self, label: &str) -> Result<PathBuf> {
        self.classification
            .iter()
            .find(|c| c.label == label)
            .map(|c| self.src_dir.join(&c.file))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "the classification '{label}' is not defined in the configuration"
                ))
            })
    }

    /// Number of samples (non-empty lines) in `label`'s raw content file.
    pub fn classifier_range(&self, label: &str) -> Result<usize> {
        let path = self.content_file(label)?;
        let file = fs::File::open(&path).map_err(|_| {
            Error::NotFound(format!("classification content file '{}'", path.display()))
        })?;
        let mut count = 0;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path) {
        let config = serde_json::json!({
            "model": {
                "name": "spam-filter",
                "author": "tests",
                "version": "1.0.0",
                "description": "spam/ham demo model"
            },
            "training_properties": {
                "epoch": 5,
                "vec_dim": 20,
                "test_ratio": 0.1,
                "architecture": "cnn",
                "batch_size": 16
            },
            "classification": [
                { "label": "spam", "file": "spam.txt" },
                { "label": "ham", "file": "ham.txt" }
            ]
        });
        fs::write(dir.join(CONFIG_FILE), config.to_string()).unwrap();
    }

    #[test]
    fn loads_and_exposes_labels_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let config = ModelConfig::load(dir.path()).unwrap();
        assert_eq!(config.model.name, "spam-filter");
        assert_eq!(config.training_properties.vec_dim, 20);
        assert_eq!(config.labels(), vec!["spam", "ham"]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let err = ModelConfig::load(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn missing_config_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound(msg) if msg.contains(CONFIG_FILE)));
    }

    #[test]
    fn classifier_range_counts_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let mut spam = fs::File::create(dir.path().join("spam.txt")).unwrap();
        writeln!(spam, "free money now").unwrap();
        writeln!(spam, "click this link").unwrap();
        let config = ModelConfig::load(dir.path()).unwrap();
        assert_eq!(config.classifier_range("spam").unwrap(), 2);
    }

    #[test]
    fn unknown_label_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let config = ModelConfig::load(dir.path()).unwrap();
        let err = config.classifier_range("eggs").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn missing_content_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());
        let config = ModelConfig::load(dir.path()).unwrap();
        let err = config.classifier_range("ham").unwrap_err();
        assert!(matches!(err, Error::NotFound(msg) if msg.contains("ham.txt")));
    }
}
