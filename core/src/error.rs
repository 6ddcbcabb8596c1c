use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::embed::EmbedError;
use crate::persistence::PersistenceError;

/// One half of a persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Index,
    Chunks,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => write!(f, "index"),
            Self::Chunks => write!(f, "chunks"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    InvalidConfig(String),
    DimensionMismatch {
        expected: usize,
        got: usize,
    },
    /// `row` is the offending vector's offset within its batch.
    NonFiniteValue {
        row: usize,
        component: usize,
    },
    BatchLengthMismatch {
        chunks: usize,
        embeddings: usize,
    },
    NotFound {
        artifact: Artifact,
        path: PathBuf,
    },
    InconsistentStore {
        vectors: usize,
        chunks: usize,
    },
    OutOfRange {
        position: usize,
        len: usize,
    },
    Embedding(EmbedError),
    Persistence(PersistenceError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid config: {message}"),
            Self::DimensionMismatch { expected, got } => {
                write!(
                    f,
                    "invalid vector dimension: expected {expected}, got {got}"
                )
            }
            Self::NonFiniteValue { row, component } => {
                write!(
                    f,
                    "vector {row} contains non-finite value at index {component}"
                )
            }
            Self::BatchLengthMismatch { chunks, embeddings } => {
                write!(
                    f,
                    "batch length mismatch: {chunks} chunks, {embeddings} embeddings"
                )
            }
            Self::NotFound { artifact, path } => {
                write!(f, "{artifact} file not found: {}", path.display())
            }
            Self::InconsistentStore { vectors, chunks } => {
                write!(
                    f,
                    "inconsistent store: {vectors} vectors but {chunks} chunks"
                )
            }
            Self::OutOfRange { position, len } => {
                write!(f, "position {position} out of range for {len} entries")
            }
            Self::Embedding(error) => write!(f, "embedding error: {error}"),
            Self::Persistence(error) => write!(f, "persistence error: {error}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Embedding(error) => Some(error),
            Self::Persistence(error) => Some(error),
            _ => None,
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<EmbedError> for StoreError {
    fn from(value: EmbedError) -> Self {
        Self::Embedding(value)
    }
}
