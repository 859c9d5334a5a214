use std::fs;
use std::path::{Path, PathBuf};

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};

/// One unit of text to classify: either a file on disk or an in-memory
/// string, plus an integer id used only as a row index in batch tensors.
///
/// The source file is read at construction time, so a missing path fails
/// immediately rather than at first tokenization.
#[derive(Debug, Clone)]
pub struct Document {
    id: usize,
    source: Option<PathBuf>,
    text: String,
}

impl Document {
    /// Builds a document from exactly one of `source` / `text`.
    pub fn new(id: usize, source: Option<&Path>, text: Option<&str>) -> Result<Self> {
        match (source, text) {
            (Some(path), None) => {
                let resolved = fs::read_to_string(path).map_err(|_| {
                    Error::NotFound(format!("document source '{}'", path.display()))
                })?;
                Ok(Self {
                    id,
                    source: Some(path.to_path_buf()),
                    text: resolved,
                })
            }
            (None, Some(text)) => Ok(Self {
                id,
                source: None,
                text: text.to_string(),
            }),
            (None, None) => Err(Error::InvalidArgument(
                "document needs either a source path or a text".into(),
            )),
            (Some(_), Some(_)) => Err(Error::InvalidArgument(
                "document takes a source path or a text, not both".into(),
            )),
        }
    }

    pub fn from_file(id: usize, path: &Path) -> Result<Self> {
        Self::new(id, Some(path), None)
    }

    pub fn from_text(id: usize, text: &str) -> Result<Self> {
        Self::new(id, None, Some(text))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The ordered word sequence of the resolved text.
    ///
    /// Words are split on Unicode word boundaries and lowercased. The same
    /// normalization runs during training-data preparation and prediction;
    /// diverging here would silently miss embedding lookups.
    pub fn words(&self) -> Vec<String> {
        self.text
            .unicode_words()
            .map(|w| w.to_lowercase())
            .collect()
    }
}
