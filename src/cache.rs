//! Query cache over a dedicated index namespace.
//!
//! Answered queries are stored as vectors in their own namespace so that a
//! semantically similar question can be served without re-scanning the
//! corpus. A lookup embeds nothing itself; it takes the already computed
//! query vector, retrieves the nearest cached entries, and accepts the
//! best one only when its similarity clears the acceptance threshold.
//!
//! Cached entries reuse the winning corpus record's id and metadata, with
//! the original question recorded under `metadata.query` and the query
//! vector stored in place of the passage vector. Re-asking the same
//! question therefore scores 1.0 on its own cache entry.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::index::{IndexedRecord, MatchResult, VectorIndex};
use crate::types::RagError;

/// Result of a cache lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheOutcome {
    /// A cached entry cleared the acceptance threshold.
    Hit { text: String, score: f32 },
    /// Nothing cached was close enough.
    Miss,
}

/// Similarity cache for previously answered queries.
pub struct QueryCache {
    index: Arc<dyn VectorIndex>,
    config: CacheConfig,
}

impl QueryCache {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self::with_config(index, CacheConfig::default())
    }

    pub fn with_config(index: Arc<dyn VectorIndex>, config: CacheConfig) -> Self {
        Self { index, config }
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Check whether a semantically close query was answered before.
    ///
    /// The acceptance check is `>=`, so a score exactly at the threshold
    /// counts as a hit.
    pub async fn lookup(&self, query_vector: &[f32]) -> Result<CacheOutcome, RagError> {
        let matches = self
            .index
            .query(&self.config.namespace, query_vector, self.config.top_k)
            .await?;

        match matches.first() {
            Some(top) if top.score >= self.config.acceptance => {
                tracing::debug!(
                    namespace = %self.config.namespace,
                    id = %top.id,
                    score = top.score,
                    "query cache hit"
                );
                Ok(CacheOutcome::Hit {
                    text: top.metadata.text.clone(),
                    score: top.score,
                })
            }
            _ => {
                tracing::debug!(namespace = %self.config.namespace, "query cache miss");
                Ok(CacheOutcome::Miss)
            }
        }
    }

    /// Record `winner` as the answer to `query_text`.
    ///
    /// The stored record keeps the winner's id and metadata but carries
    /// the query vector, so future lookups match on question similarity
    /// rather than passage similarity.
    pub async fn store(
        &self,
        winner: &MatchResult,
        query_vector: &[f32],
        query_text: &str,
    ) -> Result<(), RagError> {
        let mut metadata = winner.metadata.clone();
        metadata.query = Some(query_text.to_string());
        metadata
            .extra
            .insert("cached_at".to_string(), Value::String(Utc::now().to_rfc3339()));

        let record = IndexedRecord::new(winner.id.clone(), query_vector.to_vec(), metadata);
        self.index
            .upsert(&self.config.namespace, vec![record])
            .await?;
        tracing::debug!(
            namespace = %self.config.namespace,
            id = %winner.id,
            "cached corpus winner"
        );
        Ok(())
    }
}
