#![forbid(unsafe_code)]
//! Core of chunkvault: an exact nearest-neighbor vector store.
//!
//! A [`VectorStore`] keeps fixed-dimension `f32` vectors and the chunk text
//! each one was embedded from at the same insertion position, answers top-k
//! queries by exact squared L2 distance and persists itself as a binary
//! index file plus a JSON chunks file.

pub mod chunks;
pub mod config;
pub mod embed;
pub mod error;
pub mod index;
pub mod persistence;
pub mod store;
pub mod vector;

pub use chunks::ChunkStore;
pub use config::StoreConfig;
pub use embed::{EmbedError, Embedder};
pub use error::{Artifact, StoreError};
pub use index::{Neighbor, VectorIndex};
pub use persistence::{
    read_index_header, IndexHeader, PersistenceError, StorePaths, CHUNKS_FILE_NAME,
    INDEX_FILE_NAME,
};
pub use store::{build_and_save, SearchHit, VectorStore};
pub use vector::{l2_distance, l2_squared, PreparedL2Query, VectorError};
