//! Deterministic embedder for offline runs.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use crate::types::RagError;

use super::{Embedder, InputKind};

/// Derives a pseudo-vector from a hash of the text.
///
/// Identical texts always map to identical vectors, so a verbatim lookup
/// scores 1.0 against its indexed copy, while unrelated texts land near
/// zero similarity. The retrieval mode is deliberately ignored: tests
/// ingest with [`InputKind::Passage`] and search with [`InputKind::Query`]
/// and still expect exact self-matches.
///
/// Not a semantic embedding. Useful for demos and tests only.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMS: usize = 64;

    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dims)
            .map(|i| {
                let bits = seed.rotate_left((i as u32).wrapping_mul(8)) ^ ((i as u64) << 24);
                // Center on zero so unrelated texts do not share a quadrant.
                ((bits as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
            })
            .collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String], _kind: InputKind) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }
}
