use std::ops::Range;
use std::path::Path;

use crate::persistence::{read_pair, write_pair, StorePaths};
use crate::{ChunkStore, Embedder, StoreConfig, StoreError, VectorIndex};

/// A chunk resolved from a search, with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub chunk: String,
    pub distance: f32,
}

impl SearchHit {
    /// Display score in `(0, 1]`; `1.0` for an exact match.
    pub fn similarity(&self) -> f32 {
        1.0 / (1.0 + self.distance)
    }
}

/// Vector index and chunk texts kept position-aligned.
#[derive(Debug, Clone)]
pub struct VectorStore {
    index: VectorIndex,
    chunks: ChunkStore,
}

impl VectorStore {
    pub fn new(dimension: usize) -> Result<Self, StoreError> {
        Ok(Self::with_config(StoreConfig::with_dimension(dimension)?))
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            index: VectorIndex::new(config),
            chunks: ChunkStore::new(),
        }
    }

    /// Builds a store from a persisted pair.
    pub fn open(
        config: StoreConfig,
        index_path: impl AsRef<Path>,
        chunks_path: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::with_config(config);
        store.load(index_path, chunks_path)?;
        Ok(store)
    }

    pub fn config(&self) -> StoreConfig {
        self.index.config()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Appends parallel batches and returns the positions they landed at.
    ///
    /// Nothing is appended unless both batches have the same length and
    /// every embedding is accepted by the index.
    pub fn add_vectors<S, V>(
        &mut self,
        chunks: Vec<S>,
        embeddings: &[V],
    ) -> Result<Range<usize>, StoreError>
    where
        S: Into<String>,
        V: AsRef<[f32]>,
    {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::BatchLengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let start = self.len();
        self.index.add(embeddings)?;
        self.chunks.add(chunks);

        tracing::debug!(
            added = embeddings.len(),
            total = self.len(),
            "appended vectors"
        );
        Ok(start..self.len())
    }

    /// Embeds `chunks` with `embedder` and appends them.
    pub fn add_texts<S, E>(
        &mut self,
        chunks: Vec<S>,
        embedder: &E,
    ) -> Result<Range<usize>, StoreError>
    where
        S: Into<String> + AsRef<str>,
        E: Embedder + ?Sized,
    {
        let texts: Vec<&str> = chunks.iter().map(AsRef::as_ref).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        self.add_vectors(chunks, &embeddings)
    }

    /// Returns up to `k` chunks nearest to `query`, closest first.
    ///
    /// Positions that do not resolve to a chunk are skipped so a damaged
    /// store degrades to fewer hits instead of failing the read.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        let neighbors = self.index.search(query, k)?;

        let mut hits = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match self.chunks.get(neighbor.position) {
                Ok(chunk) => hits.push(SearchHit {
                    position: neighbor.position,
                    chunk: chunk.to_string(),
                    distance: neighbor.distance,
                }),
                Err(error) => {
                    tracing::warn!(
                        position = neighbor.position,
                        %error,
                        "skipping unresolved search hit"
                    );
                }
            }
        }
        Ok(hits)
    }

    /// Embeds `query` with `embedder` and searches for it.
    pub fn search_text<E>(
        &self,
        query: &str,
        k: usize,
        embedder: &E,
    ) -> Result<Vec<SearchHit>, StoreError>
    where
        E: Embedder + ?Sized,
    {
        let embedding = embedder.embed(query)?;
        self.search(&embedding, k)
    }

    pub fn get(&self, position: usize) -> Result<(&str, &[f32]), StoreError> {
        let chunk = self.chunks.get(position)?;
        let vector = self.index.vector(position).ok_or(StoreError::OutOfRange {
            position,
            len: self.index.len(),
        })?;
        Ok((chunk, vector))
    }

    pub fn save(
        &self,
        index_path: impl AsRef<Path>,
        chunks_path: impl AsRef<Path>,
    ) -> Result<(), StoreError> {
        let (index_path, chunks_path) = (index_path.as_ref(), chunks_path.as_ref());
        write_pair(index_path, chunks_path, &self.index, &self.chunks)?;
        tracing::info!(
            vectors = self.index.len(),
            chunks = self.chunks.len(),
            index = %index_path.display(),
            chunks_path = %chunks_path.display(),
            "saved vector store"
        );
        Ok(())
    }

    /// Replaces the in-memory state with a persisted pair. On error the
    /// store is left untouched.
    pub fn load(
        &mut self,
        index_path: impl AsRef<Path>,
        chunks_path: impl AsRef<Path>,
    ) -> Result<(), StoreError> {
        let (index_path, chunks_path) = (index_path.as_ref(), chunks_path.as_ref());
        let (index, chunks) = read_pair(index_path, chunks_path, self.config())?;
        self.index = index;
        self.chunks = chunks;
        tracing::info!(
            vectors = self.index.len(),
            index = %index_path.display(),
            chunks_path = %chunks_path.display(),
            "loaded vector store"
        );
        Ok(())
    }

    pub fn save_to(&self, paths: &StorePaths) -> Result<(), StoreError> {
        self.save(&paths.index, &paths.chunks)
    }

    pub fn load_from(&mut self, paths: &StorePaths) -> Result<(), StoreError> {
        self.load(&paths.index, &paths.chunks)
    }
}

/// Builds a store sized to the first embedding and saves it under `dir`.
pub fn build_and_save<S, V>(
    chunks: Vec<S>,
    embeddings: &[V],
    dir: impl AsRef<Path>,
) -> Result<VectorStore, StoreError>
where
    S: Into<String>,
    V: AsRef<[f32]>,
{
    let dimension = embeddings
        .first()
        .map(|embedding| embedding.as_ref().len())
        .ok_or_else(|| {
            StoreError::InvalidConfig("cannot infer dimension from an empty batch".to_string())
        })?;

    let mut store = VectorStore::new(dimension)?;
    store.add_vectors(chunks, embeddings)?;
    store.save_to(&StorePaths::in_dir(dir))?;
    Ok(store)
}

#[cfg(test)]
mod tests;
