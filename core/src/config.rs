use crate::StoreError;

/// Shape and validation settings shared by a store and its vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub dimension: usize,
    /// When true, NaN and +/-Inf components are rejected on add and search.
    pub strict_finite: bool,
}

impl StoreConfig {
    pub fn new(dimension: usize, strict_finite: bool) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::InvalidConfig(
                "dimension must be > 0".to_string(),
            ));
        }

        Ok(Self {
            dimension,
            strict_finite,
        })
    }

    /// Strict configuration for the given dimension.
    pub fn with_dimension(dimension: usize) -> Result<Self, StoreError> {
        Self::new(dimension, true)
    }
}
