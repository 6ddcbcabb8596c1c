use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{Artifact, ChunkStore, StoreConfig, StoreError, VectorIndex};

mod chunks_file;
mod fsync;
mod index_file;

use chunks_file::{decode_chunks, encode_chunks};
use fsync::{
    backup_path, discard, ensure_parent_dir, preserve_previous, resolved_path, staging_path,
    sync_parent_dir, write_synced,
};
use index_file::{decode_header, decode_index, encode_index};

pub use index_file::IndexHeader;

pub const INDEX_FILE_NAME: &str = "index.bin";
pub const CHUNKS_FILE_NAME: &str = "chunks.json";

#[derive(Debug)]
pub enum PersistenceError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    InvalidData(String),
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::InvalidData(message) => write!(f, "invalid persistence data: {message}"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "index checksum mismatch: stored {expected:#010x}, computed {actual:#010x}"
            ),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Serde(error) => Some(error),
            Self::InvalidData(_) | Self::ChecksumMismatch { .. } => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Locations of the two files that make up a persisted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub index: PathBuf,
    pub chunks: PathBuf,
}

impl StorePaths {
    pub fn new(index: impl Into<PathBuf>, chunks: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            chunks: chunks.into(),
        }
    }

    /// `dir/index.bin` and `dir/chunks.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(INDEX_FILE_NAME), dir.join(CHUNKS_FILE_NAME))
    }
}

/// Writes both files of a store.
///
/// Each file is staged next to its destination and synced; destinations are
/// only replaced once both staged writes succeeded. The previous index is
/// kept aside until the chunks file is in place and is restored if that last
/// step fails, so a failed save leaves the previous pair as it was.
pub(crate) fn write_pair(
    index_path: &Path,
    chunks_path: &Path,
    index: &VectorIndex,
    chunks: &ChunkStore,
) -> Result<(), PersistenceError> {
    ensure_parent_dir(index_path)?;
    ensure_parent_dir(chunks_path)?;
    ensure_distinct_files(index_path, chunks_path)?;

    let index_staged = staging_path(index_path);
    let chunks_staged = staging_path(chunks_path);
    let staged = write_synced(&index_staged, |writer| encode_index(writer, index)).and_then(|_| {
        write_synced(&chunks_staged, |writer| {
            encode_chunks(writer, chunks.as_slice())
        })
    });
    let previous_index = staged.and_then(|_| preserve_previous(index_path));
    let previous_index = match previous_index {
        Ok(backup) => backup,
        Err(error) => {
            discard(&index_staged);
            discard(&chunks_staged);
            return Err(error);
        }
    };

    if let Err(error) = fs::rename(&index_staged, index_path) {
        discard(&index_staged);
        discard(&chunks_staged);
        if let Some(backup) = &previous_index {
            discard(backup);
        }
        return Err(error.into());
    }
    if let Err(error) = fs::rename(&chunks_staged, chunks_path) {
        tracing::error!(
            index = %index_path.display(),
            chunks = %chunks_path.display(),
            %error,
            "chunks file could not be moved into place, rolling back the index"
        );
        discard(&chunks_staged);
        restore_previous(index_path, previous_index.as_deref());
        return Err(error.into());
    }
    if let Some(backup) = &previous_index {
        discard(backup);
    }

    sync_parent_dir(index_path)?;
    if index_path.parent() != chunks_path.parent() {
        sync_parent_dir(chunks_path)?;
    }
    Ok(())
}

/// Reads both files of a store and checks them against `config` and each
/// other. Nothing is returned unless both decode and agree.
pub(crate) fn read_pair(
    index_path: &Path,
    chunks_path: &Path,
    config: StoreConfig,
) -> Result<(VectorIndex, ChunkStore), StoreError> {
    for (artifact, path) in [(Artifact::Index, index_path), (Artifact::Chunks, chunks_path)] {
        if !path.try_exists().map_err(PersistenceError::from)? {
            return Err(StoreError::NotFound {
                artifact,
                path: path.to_path_buf(),
            });
        }
    }

    let decoded = decode_index(open_buffered(index_path)?)?;
    if decoded.dimension != config.dimension {
        return Err(StoreError::DimensionMismatch {
            expected: config.dimension,
            got: decoded.dimension,
        });
    }
    let index = VectorIndex::from_flat(config, decoded.values)?;
    let chunks = ChunkStore::from(decode_chunks(open_buffered(chunks_path)?)?);

    if index.len() != chunks.len() {
        return Err(StoreError::InconsistentStore {
            vectors: index.len(),
            chunks: chunks.len(),
        });
    }
    Ok((index, chunks))
}

/// Reads only the header of a persisted index, e.g. to learn its dimension
/// before opening the store.
pub fn read_index_header(path: impl AsRef<Path>) -> Result<IndexHeader, StoreError> {
    let path = path.as_ref();
    if !path.try_exists().map_err(PersistenceError::from)? {
        return Err(StoreError::NotFound {
            artifact: Artifact::Index,
            path: path.to_path_buf(),
        });
    }
    Ok(decode_header(open_buffered(path)?)?)
}

/// Rejects path pairs that resolve to the same file or whose staging and
/// backup siblings would overwrite the other artifact.
fn ensure_distinct_files(index_path: &Path, chunks_path: &Path) -> Result<(), PersistenceError> {
    let index = resolved_path(index_path)?;
    let chunks = resolved_path(chunks_path)?;
    let index_files = [staging_path(&index), backup_path(&index), index];
    let chunks_files = [staging_path(&chunks), chunks];

    if index_files.iter().any(|path| chunks_files.contains(path)) {
        return Err(PersistenceError::InvalidData(format!(
            "index {} and chunks {} must be saved to distinct files",
            index_path.display(),
            chunks_path.display()
        )));
    }
    Ok(())
}

fn restore_previous(index_path: &Path, backup: Option<&Path>) {
    let restored = match backup {
        Some(backup) => fs::rename(backup, index_path),
        None => fs::remove_file(index_path),
    };
    if let Err(error) = restored {
        tracing::error!(
            index = %index_path.display(),
            %error,
            "index could not be rolled back after a failed save"
        );
    }
}

fn open_buffered(path: &Path) -> Result<BufReader<File>, PersistenceError> {
    Ok(BufReader::new(File::open(path)?))
}
