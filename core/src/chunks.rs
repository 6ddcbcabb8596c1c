use crate::StoreError;

/// Ordered chunk texts, position-aligned with a [`crate::VectorIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStore {
    chunks: Vec<String>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn add<I, S>(&mut self, batch: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks.extend(batch.into_iter().map(Into::into));
    }

    pub fn get(&self, position: usize) -> Result<&str, StoreError> {
        self.chunks
            .get(position)
            .map(String::as_str)
            .ok_or(StoreError::OutOfRange {
                position,
                len: self.chunks.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.chunks.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.chunks
    }
}

impl From<Vec<String>> for ChunkStore {
    fn from(chunks: Vec<String>) -> Self {
        Self { chunks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_order_and_accepts_any_text() {
        let mut store = ChunkStore::new();
        store.add(["first", "", "line one\nline two"]);
        store.add(vec!["tail".to_string()]);

        assert_eq!(store.len(), 4);
        assert_eq!(store.get(0).expect("must exist"), "first");
        assert_eq!(store.get(1).expect("must exist"), "");
        assert_eq!(store.get(2).expect("must exist"), "line one\nline two");
        assert_eq!(
            store.iter().collect::<Vec<_>>(),
            vec!["first", "", "line one\nline two", "tail"]
        );
    }

    #[test]
    fn get_past_end_is_out_of_range() {
        let store = ChunkStore::from(vec!["only".to_string()]);
        let error = store.get(1).expect_err("must fail");
        assert!(matches!(
            error,
            StoreError::OutOfRange {
                position: 1,
                len: 1
            }
        ));
    }
}
