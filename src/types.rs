//! Shared error taxonomy for the retrieval engine.
//!
//! Every fallible collaborator (embedding gateway, vector index, text
//! generation, ingestion) maps its failures into [`RagError`] close to the
//! call site, so callers never see raw transport errors. The variant tells
//! you which collaborator misbehaved; the payload carries the upstream
//! detail for logs.

use thiserror::Error;

/// Unified error type for retrieval, ingestion, and synthesis operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding service rejected a request or returned a malformed
    /// response.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// A vector index query or upsert failed.
    #[error("vector index request failed: {0}")]
    Index(String),

    /// The text-generation service rejected a request or returned a
    /// response without usable content.
    #[error("text generation failed: {0}")]
    Generation(String),

    /// Sentence segmentation or token accounting went wrong.
    #[error("chunking failed: {0}")]
    Chunking(String),

    /// Document ingestion could not complete, including retry exhaustion.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Invalid or missing configuration (endpoints, credentials, limits).
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_identify_the_collaborator() {
        let err = RagError::Embedding("429 too many requests".into());
        assert_eq!(
            err.to_string(),
            "embedding request failed: 429 too many requests"
        );

        let err = RagError::Index("namespace unavailable".into());
        assert!(err.to_string().starts_with("vector index request failed"));
    }
}
