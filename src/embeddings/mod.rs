//! Embedding gateway.
//!
//! Everything downstream (cache, search, ingestion) talks to the
//! [`Embedder`] trait, never to a concrete HTTP client. The trait is
//! asymmetric-aware: e5-family models embed queries and passages
//! differently, and mixing the two modes silently degrades retrieval, so
//! the mode is an explicit argument rather than a constructor option.
//!
//! Implementations:
//! - [`RemoteEmbedder`]: inference REST API, used in production
//! - [`HashEmbedder`]: deterministic local vectors, used in tests and demos

mod hash;
mod remote;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

use async_trait::async_trait;

use crate::types::RagError;

/// Which side of an asymmetric retrieval model a text belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// A question searching the corpus.
    Query,
    /// Corpus or document text being indexed.
    Passage,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Query => "query",
            InputKind::Passage => "passage",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts text into fixed-dimensional vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts in one call, preserving input order.
    ///
    /// Implementations must return exactly one vector per input text or
    /// fail with [`RagError::Embedding`].
    async fn embed(&self, texts: &[String], kind: InputKind) -> Result<Vec<Vec<f32>>, RagError>;

    /// Vector dimensionality produced by this embedder.
    fn dims(&self) -> usize;

    /// Embed a single text. Convenience over [`Embedder::embed`].
    async fn embed_one(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, RagError> {
        let batch = [text.to_string()];
        let vectors = self.embed(&batch, kind).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("service returned no vector".into()))
    }
}
