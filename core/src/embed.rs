//! Text-to-vector capability injected by callers.
//!
//! The store never owns a model. Ingestion and query helpers take an
//! [`Embedder`] per call, so any backend (an ONNX session, a remote service,
//! a test closure) can be plugged in without global state.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedError {
    message: String,
}

impl EmbedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for EmbedError {}

pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embeds texts in order. Backends with native batching should override.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<F> Embedder for F
where
    F: Fn(&str) -> Vec<f32>,
{
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::new(format!("cannot embed '{text}'")))
        }
    }

    #[test]
    fn closures_embed_in_order() {
        let embedder = |text: &str| vec![text.len() as f32];
        let vectors = embedder
            .embed_batch(&["a", "bbb", ""])
            .expect("must succeed");
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![0.0]]);
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let error = FailingEmbedder
            .embed_batch(&["x", "y"])
            .expect_err("must fail");
        assert_eq!(error.message(), "cannot embed 'x'");
    }
}
