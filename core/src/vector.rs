use std::error::Error;
use std::fmt;
use wide::f32x8;

/// Error type for standalone distance computations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// Returned when vectors do not share the same dimension.
    DimensionMismatch { left: usize, right: usize },
    /// Returned when one or both vectors are empty.
    EmptyVector,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { left, right } => {
                write!(f, "dimension mismatch: left={left}, right={right}")
            }
            Self::EmptyVector => write!(f, "vector is empty"),
        }
    }
}

impl Error for VectorError {}

fn validate_pair(left: &[f32], right: &[f32]) -> Result<(), VectorError> {
    if left.is_empty() || right.is_empty() {
        return Err(VectorError::EmptyVector);
    }
    if left.len() != right.len() {
        return Err(VectorError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Computes the squared Euclidean distance between two vectors.
///
/// This is the value ranked and reported by [`crate::VectorIndex::search`].
pub fn l2_squared(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    validate_pair(left, right)?;
    Ok(simd_l2_squared(left, right))
}

/// Computes the true Euclidean (L2) distance between two vectors.
pub fn l2_distance(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    l2_squared(left, right).map(f32::sqrt)
}

/// Returns the position of the first NaN or infinite component, if any.
pub fn first_non_finite(values: &[f32]) -> Option<usize> {
    values.iter().position(|value| !value.is_finite())
}

const SIMD_WIDTH: usize = 8;

/// Query packed once into SIMD lanes and reused across a full index scan.
#[derive(Debug, Clone)]
pub struct PreparedL2Query {
    len: usize,
    simd_query: Vec<f32x8>,
    tail: [f32; SIMD_WIDTH],
    tail_len: usize,
}

impl PreparedL2Query {
    pub fn new(query: &[f32]) -> Self {
        let mut chunks = query.chunks_exact(SIMD_WIDTH);
        let simd_query = chunks.by_ref().map(load_f32x8).collect();
        let remainder = chunks.remainder();

        let mut tail = [0.0f32; SIMD_WIDTH];
        tail[..remainder.len()].copy_from_slice(remainder);

        Self {
            len: query.len(),
            simd_query,
            tail,
            tail_len: remainder.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Squared L2 distance against a vector of the same length.
    ///
    /// Callers must guarantee `candidate.len() == self.len()`.
    pub fn l2_squared(&self, candidate: &[f32]) -> f32 {
        debug_assert_eq!(candidate.len(), self.len);
        let simd_prefix_len = self.simd_query.len() * SIMD_WIDTH;
        let (prefix, tail) = candidate.split_at(simd_prefix_len);

        // Two accumulators keep the dependency chain short on wide vectors.
        let mut even = f32x8::ZERO;
        let mut odd = f32x8::ZERO;
        for (lane, (query_v, chunk)) in self
            .simd_query
            .iter()
            .zip(prefix.chunks_exact(SIMD_WIDTH))
            .enumerate()
        {
            let delta = *query_v - load_f32x8(chunk);
            if lane % 2 == 0 {
                even += delta * delta;
            } else {
                odd += delta * delta;
            }
        }

        let mut scalar_sum = 0.0f32;
        for (query_value, value) in self.tail[..self.tail_len].iter().zip(tail) {
            let delta = query_value - value;
            scalar_sum += delta * delta;
        }

        (even + odd).reduce_add() + scalar_sum
    }
}

fn load_f32x8(values: &[f32]) -> f32x8 {
    debug_assert_eq!(values.len(), SIMD_WIDTH);
    f32x8::from([
        values[0], values[1], values[2], values[3], values[4], values[5], values[6], values[7],
    ])
}

fn simd_l2_squared(left: &[f32], right: &[f32]) -> f32 {
    let mut left_chunks = left.chunks_exact(SIMD_WIDTH);
    let mut right_chunks = right.chunks_exact(SIMD_WIDTH);
    let mut simd_sum = f32x8::ZERO;

    for (left_chunk, right_chunk) in left_chunks.by_ref().zip(right_chunks.by_ref()) {
        let delta = load_f32x8(left_chunk) - load_f32x8(right_chunk);
        simd_sum += delta * delta;
    }

    let mut scalar_sum = 0.0f32;
    for (left_value, right_value) in left_chunks.remainder().iter().zip(right_chunks.remainder()) {
        let delta = left_value - right_value;
        scalar_sum += delta * delta;
    }

    simd_sum.reduce_add() + scalar_sum
}

#[cfg(test)]
mod tests;
