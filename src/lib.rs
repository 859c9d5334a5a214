//! Text-classification pipeline over word embeddings.
//!
//! Labeled text is normalized into an on-disk training structure, documents
//! are assembled into fixed-shape tensors by embedding lookup and scaling,
//! a classifier backend scores them, and the four resulting artifacts
//! (embeddings, scaler, classifier, label list) travel together as one
//! model cluster.
//!
//! # Basic usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dltc::ModelCluster;
//! use std::path::Path;
//!
//! let cluster = ModelCluster::load(Path::new("spam_model"))?;
//! for ranked in cluster.predict_text("free money, click now")? {
//!     println!("{}: {:.3}", ranked.label, ranked.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The embedding trainer and any neural network architecture are external
//! collaborators behind the [`EmbeddingLookup`], [`VectorScaler`] and
//! [`Classifier`] traits; this crate only orchestrates them.

pub mod assemble;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod rank;
pub mod runtime;
pub mod scaler;
pub mod structure;

pub use classifier::{CentroidClassifier, Classifier, InputShape, OnnxClassifier};
pub use cluster::{ClusterState, ModelCluster};
pub use config::ModelConfig;
pub use document::Document;
pub use embedding::{EmbeddingLookup, WordEmbeddings};
pub use error::{Error, Result};
pub use rank::{rank, top, RankedLabel};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use scaler::{StandardScaler, VectorScaler};
pub use structure::{build_structure, TrainingStructure};

pub fn init_logger() {
    env_logger::init();
}
