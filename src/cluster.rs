use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::assemble::{assemble_batch, assemble_document};
use crate::classifier::{CentroidClassifier, Classifier, OnnxClassifier};
use crate::document::Document;
use crate::embedding::{EmbeddingLookup, WordEmbeddings};
use crate::error::{Error, Result};
use crate::rank::{rank, RankedLabel};
use crate::scaler::StandardScaler;
use crate::structure::TrainingStructure;

/// Manifest file naming the four artifact files of a saved cluster.
pub const MANIFEST_FILE: &str = "cluster.json";

const EMBEDDINGS_EXT: &str = "emb";
const SCALER_EXT: &str = "scl";
const CLASSIFIER_EXT: &str = "clf";
const LABELS_EXT: &str = "lab";

/// Readiness of a model cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Empty,
    PartiallyLoaded,
    Ready,
}

/// On-disk index of a saved cluster. An explicit manifest, rather than a
/// naming convention derived from the directory name, is what `load` trusts.
#[derive(Debug, Serialize, Deserialize)]
struct ClusterManifest {
    name: String,
    classifier_kind: String,
    embeddings: String,
    scaler: String,
    classifier: String,
    labels: String,
}

/// Binds the four artifacts needed for prediction — embeddings, scaler,
/// classifier, label list — and loads/saves them as one addressable unit.
///
/// Each artifact is populated independently, by a training step or by
/// `load`; prediction is gated until all four are set. Re-setting an
/// artifact in memory warns and proceeds (retraining is never blocked);
/// overwriting a classifier file on disk is a hard error unless requested.
#[derive(Default)]
pub struct ModelCluster {
    embeddings: Option<WordEmbeddings>,
    scaler: Option<StandardScaler>,
    classifier: Option<Box<dyn Classifier>>,
    labels: Option<Vec<String>>,
}

impl std::fmt::Debug for ModelCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCluster")
            .field("state", &self.state())
            .field("labels", &self.labels)
            .finish()
    }
}

impl ModelCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClusterState {
        let set = [
            self.embeddings.is_some(),
            self.scaler.is_some(),
            self.classifier.is_some(),
            self.labels.is_some(),
        ]
        .iter()
        .filter(|&&s| s)
        .count();
        match set {
            0 => ClusterState::Empty,
            4 => ClusterState::Ready,
            _ => ClusterState::PartiallyLoaded,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ClusterState::Ready
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    pub fn set_embeddings(&mut self, embeddings: WordEmbeddings) {
        if self.embeddings.is_some() {
            warn!("overwriting already set word embeddings");
        }
        self.embeddings = Some(embeddings);
    }

    pub fn set_scaler(&mut self, scaler: StandardScaler) {
        if self.scaler.is_some() {
            warn!("overwriting already fitted scaler");
        }
        self.scaler = Some(scaler);
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn Classifier>) {
        if self.classifier.is_some() {
            warn!("overwriting already set classifier");
        }
        self.classifier = Some(classifier);
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        if self.labels.is_some() {
            warn!("overwriting already set label list");
        }
        self.labels = Some(labels);
    }

    /// Fits the scaler over the embeddings of every word in the training
    /// structure's documents. Requires embeddings to be set.
    pub fn fit_scaler(&mut self, structure: &TrainingStructure) -> Result<()> {
        let embeddings = self.embeddings.as_ref().ok_or_else(|| {
            Error::NotReady("word embeddings are not set; load or train them first".into())
        })?;

        let (docs, _) = structure.load_training_data()?;
        let mut rows: Vec<Vec<f32>> = Vec::new();
        for doc in &docs {
            for word in doc.words() {
                if let Some(vector) = embeddings.vector(&word) {
                    rows.push(vector.to_vec());
                }
            }
        }
        let scaler = StandardScaler::fit(rows.iter().map(Vec::as_slice))?;
        self.set_scaler(scaler);
        Ok(())
    }

    /// Assembles the training structure into a batch tensor and fits the
    /// supplied classifier backend on it, then installs classifier and
    /// labels. Requires embeddings and scaler to be set.
    pub fn train_classifier(
        &mut self,
        mut classifier: Box<dyn Classifier>,
        structure: &TrainingStructure,
    ) -> Result<()> {
        let embeddings = self.embeddings.as_ref().ok_or_else(|| {
            Error::NotReady("word embeddings are not set; load or train them first".into())
        })?;
        let scaler = self
            .scaler
            .as_ref()
            .ok_or_else(|| Error::NotReady("the scaler is not fitted; run fit_scaler first".into()))?;

        let labels = structure.labels().to_vec();
        if classifier.output_width() != labels.len() {
            return Err(Error::InvalidArgument(format!(
                "classifier has {} outputs for {} labels",
                classifier.output_width(),
                labels.len()
            )));
        }

        let (docs, targets) = structure.load_training_data()?;
        let batch = assemble_batch(&docs, classifier.input_shape(), embeddings, scaler)?;
        classifier.fit(&batch, &targets)?;

        self.set_classifier(classifier);
        self.set_labels(labels);
        Ok(())
    }

    fn require_ready(
        &self,
    ) -> Result<(&WordEmbeddings, &StandardScaler, &dyn Classifier, &[String])> {
        let embeddings = self
            .embeddings
            .as_ref()
            .ok_or_else(|| Error::NotReady("embeddings artifact is not set".into()))?;
        let scaler = self
            .scaler
            .as_ref()
            .ok_or_else(|| Error::NotReady("scaler artifact is not set".into()))?;
        let classifier = self
            .classifier
            .as_deref()
            .ok_or_else(|| Error::NotReady("classifier artifact is not set".into()))?;
        let labels = self
            .labels
            .as_deref()
            .ok_or_else(|| Error::NotReady("label list is not set".into()))?;

        // Mutual consistency: these widths were fixed at training time.
        let shape = classifier.input_shape();
        if embeddings.dimension() != shape.embedding_size {
            return Err(Error::InvalidArgument(format!(
                "embeddings have dimension {}, classifier expects {}",
                embeddings.dimension(),
                shape.embedding_size
            )));
        }
        if classifier.output_width() != labels.len() {
            return Err(Error::InvalidArgument(format!(
                "classifier has {} outputs for {} labels",
                classifier.output_width(),
                labels.len()
            )));
        }
        Ok((embeddings, scaler, classifier, labels))
    }

    /// Predicts ranked labels for an in-memory text.
    pub fn predict_text(&self, text: &str) -> Result<Vec<RankedLabel>> {
        self.predict(&Document::from_text(0, text)?)
    }

    /// Predicts ranked labels for a text file.
    pub fn predict_file(&self, path: &Path) -> Result<Vec<RankedLabel>> {
        self.predict(&Document::from_file(0, path)?)
    }

    fn predict(&self, doc: &Document) -> Result<Vec<RankedLabel>> {
        let (embeddings, scaler, classifier, labels) = self.require_ready()?;
        let tensor = assemble_document(doc, classifier.input_shape(), embeddings, scaler)?;
        let scores = classifier.predict(&tensor)?;
        if scores.ncols() != labels.len() {
            return Err(Error::InvalidArgument(format!(
                "classifier returned {} scores for {} labels",
                scores.ncols(),
                labels.len()
            )));
        }
        let row = scores.row(0).to_vec();
        rank(labels, &row)
    }

    /// Saves the four artifacts plus the manifest into `directory`.
    ///
    /// The classifier file is the guarded artifact: if it already exists
    /// and `overwrite` is false this fails `AlreadyExists` before anything
    /// is written. Partially written sets from a failure mid-save are not
    /// rolled back.
    pub fn save(&self, directory: &Path, overwrite: bool) -> Result<()> {
        let (embeddings, scaler, classifier, labels) = self.require_ready()?;

        let name = directory
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("model")
            .to_string();
        let manifest = ClusterManifest {
            classifier_kind: classifier.kind().to_string(),
            embeddings: format!("{name}.{EMBEDDINGS_EXT}"),
            scaler: format!("{name}.{SCALER_EXT}"),
            classifier: format!("{name}.{CLASSIFIER_EXT}"),
            labels: format!("{name}.{LABELS_EXT}"),
            name,
        };

        fs::create_dir_all(directory)?;
        let classifier_path = directory.join(&manifest.classifier);
        if classifier_path.exists() && !overwrite {
            return Err(Error::AlreadyExists(classifier_path));
        }

        classifier.save_weights(&classifier_path)?;
        embeddings.save(&directory.join(&manifest.embeddings))?;
        scaler.save(&directory.join(&manifest.scaler))?;
        fs::write(
            directory.join(&manifest.labels),
            serde_json::to_string_pretty(labels)?,
        )?;
        fs::write(
            directory.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        info!("saved model cluster '{}' to {}", manifest.name, directory.display());
        Ok(())
    }

    /// Loads a saved cluster. Every artifact file the manifest names must
    /// exist; a missing one fails `NotFound` naming that specific file.
    pub fn load(directory: &Path) -> Result<Self> {
        if !directory.exists() {
            return Err(Error::NotFound(format!(
                "model directory '{}'",
                directory.display()
            )));
        }
        let manifest_path = directory.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&manifest_path).map_err(|_| {
            Error::NotFound(format!("cluster manifest '{}'", manifest_path.display()))
        })?;
        let manifest: ClusterManifest = serde_json::from_str(&raw)?;

        let embeddings_path = directory.join(&manifest.embeddings);
        let scaler_path = directory.join(&manifest.scaler);
        let classifier_path = directory.join(&manifest.classifier);
        let labels_path = directory.join(&manifest.labels);
        for (what, path) in [
            ("embeddings file", &embeddings_path),
            ("scaler file", &scaler_path),
            ("classifier file", &classifier_path),
            ("labels file", &labels_path),
        ] {
            if !path.exists() {
                return Err(Error::NotFound(format!("{} '{}'", what, path.display())));
            }
        }

        let labels: Vec<String> = serde_json::from_str(&fs::read_to_string(&labels_path)?)?;
        let classifier: Box<dyn Classifier> = match manifest.classifier_kind.as_str() {
            "centroid" => Box::new(CentroidClassifier::load(&classifier_path)?),
            "onnx" => Box::new(OnnxClassifier::load(&classifier_path)?),
            other => {
                return Err(Error::Serialization(format!(
                    "unknown classifier kind '{other}' in manifest"
                )))
            }
        };

        let cluster = Self {
            embeddings: Some(WordEmbeddings::load(&embeddings_path)?),
            scaler: Some(StandardScaler::load(&scaler_path)?),
            classifier: Some(classifier),
            labels: Some(labels),
        };
        info!(
            "loaded model cluster '{}' from {}",
            manifest.name,
            directory.display()
        );
        Ok(cluster)
    }
}
