use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capability interface over whatever produces word vectors.
///
/// The lookup either knows a word or it does not; out-of-vocabulary words
/// are signalled by `None`, never by an error, so callers can apply their
/// own fallback policy.
pub trait EmbeddingLookup {
    /// The fixed dimension of every vector this lookup returns.
    fn dimension(&self) -> usize;

    /// The raw (unscaled) vector for `word`, or `None` if out of vocabulary.
    fn vector(&self, word: &str) -> Option<&[f32]>;
}

/// An in-memory word-vector table, the embeddings artifact of a model
/// cluster. Training the vectors is the embedding trainer's job; this type
/// only stores, serves, and persists them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEmbeddings {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    /// Builds the table from `(word, vector)` pairs, rejecting any vector
    /// whose length disagrees with `dimension`.
    pub fn from_pairs(
        dimension: usize,
        pairs: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self> {
        let mut embeddings = Self::new(dimension);
        for (word, vector) in pairs {
            embeddings.insert(word, vector)?;
        }
        Ok(embeddings)
    }

    pub fn insert(&mut self, word: String, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::InvalidArgument(format!(
                "vector for '{}' has dimension {}, expected {}",
                word,
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.insert(word, vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Imports the word2vec text interchange format: a `<count> <dim>`
    /// header line followed by `word v1 .. vd` rows.
    pub fn import_word2vec_text(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .map_err(|_| Error::NotFound(format!("embeddings file '{}'", path.display())))?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .transpose()?
            .ok_or_else(|| Error::Serialization("empty embeddings file".into()))?;
        let mut parts = header.split_whitespace();
        let _count: usize = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| Error::Serialization("malformed word2vec header".into()))?;
        let dimension: usize = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| Error::Serialization("malformed word2vec header".into()))?;

        let mut embeddings = Self::new(dimension);
        for line in lines {
            let line = line?;
            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(w) => w.to_string(),
                None => continue,
            };
            let vector: Vec<f32> = fields
                .map(|f| {
                    f.parse::<f32>().map_err(|_| {
                        Error::Serialization(format!("bad vector component for '{word}'"))
                    })
                })
                .collect::<Result<_>>()?;
            embeddings.insert(word, vector)?;
        }
        Ok(embeddings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|_| Error::NotFound(format!("embeddings file '{}'", path.display())))?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

impl EmbeddingLookup for WordEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_hits_and_misses() {
        let embeddings = WordEmbeddings::from_pairs(
            2,
            [("spam".to_string(), vec![1.0, 2.0])],
        )
        .unwrap();
        assert_eq!(embeddings.vector("spam"), Some([1.0, 2.0].as_slice()));
        assert_eq!(embeddings.vector("ham"), None);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut embeddings = WordEmbeddings::new(3);
        let err = embeddings.insert("spam".into(), vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn word2vec_text_import() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2 3").unwrap();
        writeln!(file, "spam 0.1 0.2 0.3").unwrap();
        writeln!(file, "ham -1 0 1").unwrap();
        let embeddings = WordEmbeddings::import_word2vec_text(file.path()).unwrap();
        assert_eq!(embeddings.dimension(), 3);
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings.vector("ham"), Some([-1.0, 0.0, 1.0].as_slice()));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.emb");
        let embeddings = WordEmbeddings::from_pairs(
            2,
            [("spam".to_string(), vec![0.5, -0.5])],
        )
        .unwrap();
        embeddings.save(&path).unwrap();
        let loaded = WordEmbeddings::load(&path).unwrap();
        assert_eq!(loaded.vector("spam"), Some([0.5, -0.5].as_slice()));
    }
}
