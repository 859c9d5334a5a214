use std::io;
use std::path::PathBuf;

/// Crate-wide error type covering the pipeline's failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required file or directory is missing. The message names the
    /// specific path so callers can tell which artifact failed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed construction or an invalid request (unknown label,
    /// mismatched dimensions, a document with neither source nor text).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation that needs a fully populated model cluster was called
    /// before all four artifacts were set.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Refusing to overwrite an existing classifier artifact without an
    /// explicit overwrite request.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Failure inside the ONNX runtime (session build or inference).
    #[error("model error: {0}")]
    Model(String),
}

impl From<ort::Error> for Error {
    fn from(err: ort::Error) -> Self {
        Error::Model(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
