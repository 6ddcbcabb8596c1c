use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::vector::{first_non_finite, PreparedL2Query};
use crate::{StoreConfig, StoreError};

/// One ranked search result: insertion position and squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Append-only, row-major collection of fixed-dimension vectors with exact
/// squared-L2 search.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    config: StoreConfig,
    values: Vec<f32>,
}

impl VectorIndex {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            values: Vec::new(),
        }
    }

    /// Rebuilds an index from row-major values, validating them the same way
    /// [`VectorIndex::add`] does.
    pub fn from_flat(config: StoreConfig, values: Vec<f32>) -> Result<Self, StoreError> {
        if values.len() % config.dimension != 0 {
            return Err(StoreError::InvalidConfig(format!(
                "{} values do not form whole vectors of dimension {}",
                values.len(),
                config.dimension
            )));
        }

        let index = Self { config, values };
        if index.config.strict_finite {
            for (row, vector) in index.iter().enumerate() {
                if let Some(component) = first_non_finite(vector) {
                    return Err(StoreError::NonFiniteValue { row, component });
                }
            }
        }
        Ok(index)
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn len(&self) -> usize {
        self.values.len() / self.config.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Appends a batch in order. Either every vector is accepted or none is.
    pub fn add<V: AsRef<[f32]>>(&mut self, batch: &[V]) -> Result<(), StoreError> {
        for (row, vector) in batch.iter().enumerate() {
            self.validate(row, vector.as_ref())?;
        }

        self.values.reserve(batch.len() * self.config.dimension);
        for vector in batch {
            self.values.extend_from_slice(vector.as_ref());
        }
        Ok(())
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let dimension = self.config.dimension;
        let start = position.checked_mul(dimension)?;
        self.values.get(start..start.checked_add(dimension)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.values.chunks_exact(self.config.dimension)
    }

    /// Stored components in row-major order.
    pub fn as_flat(&self) -> &[f32] {
        &self.values
    }

    /// Returns the `min(k, len)` nearest vectors by squared L2 distance,
    /// ascending, with ties resolved toward the lower position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError> {
        self.validate(0, query)?;

        let keep = k.min(self.len());
        if keep == 0 {
            return Ok(Vec::new());
        }

        let prepared = PreparedL2Query::new(query);
        let mut heap = BinaryHeap::with_capacity(keep);
        for (position, vector) in self.iter().enumerate() {
            let candidate = HeapCandidate {
                position,
                distance: prepared.l2_squared(vector),
            };
            if heap.len() < keep {
                heap.push(candidate);
                continue;
            }

            // Later positions never displace an equal-distance incumbent.
            let should_replace = heap
                .peek()
                .is_some_and(|worst| candidate.cmp(worst).is_lt());
            if should_replace {
                let _ = heap.pop();
                heap.push(candidate);
            }
        }

        let mut ranked = heap.into_vec();
        ranked.sort_unstable();
        Ok(ranked
            .into_iter()
            .map(|candidate| Neighbor {
                position: candidate.position,
                distance: candidate.distance,
            })
            .collect())
    }

    fn validate(&self, row: usize, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.config.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }

        if self.config.strict_finite {
            if let Some(component) = first_non_finite(vector) {
                return Err(StoreError::NonFiniteValue { row, component });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapCandidate {
    position: usize,
    distance: f32,
}

impl PartialEq for HeapCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for HeapCandidate {}

impl PartialOrd for HeapCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_key(self.distance)
            .total_cmp(&rank_key(other.distance))
            .then_with(|| self.position.cmp(&other.position))
    }
}

// NaN only reaches the scan in permissive mode; it always ranks last.
fn rank_key(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}
