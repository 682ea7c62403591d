//! Corpus-wide best-match search across registered namespaces.
//!
//! The corpus is sharded into namespaces (`ind_1` through `ind_N` by
//! default). A search queries every registered namespace with the same
//! query vector and reduces all candidates to the single global best by
//! raw score. Namespace queries run concurrently up to a configured limit,
//! but the reduction is performed in registry order, so when two
//! namespaces tie the earlier-registered one wins deterministically.
//!
//! A namespace whose query fails is logged and skipped; one unhealthy
//! shard degrades recall instead of failing the request. Only when every
//! namespace is empty or unreachable does the search come back empty.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;

use crate::config::SearchConfig;
use crate::index::{MatchResult, VectorIndex};
use crate::types::RagError;

/// Ordered set of namespaces a search visits.
///
/// Order matters: it is the tie-break priority during reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceRegistry {
    names: Vec<String>,
}

impl NamespaceRegistry {
    /// Number of `ind_*` shards in the production corpus.
    pub const DEFAULT_SHARDS: usize = 42;

    /// Registry of `shards` corpus namespaces named `ind_1` through
    /// `ind_<shards>`.
    pub fn corpus(shards: usize) -> Self {
        Self {
            names: (1..=shards).map(|n| format!("ind_{n}")).collect(),
        }
    }

    /// Registry over explicitly named namespaces, kept in the given order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Single-namespace registry, used for uploaded-document sessions.
    pub fn single(namespace: impl Into<String>) -> Self {
        Self {
            names: vec![namespace.into()],
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::corpus(Self::DEFAULT_SHARDS)
    }
}

/// Fan-out search over a [`NamespaceRegistry`].
pub struct CorpusSearcher {
    index: Arc<dyn VectorIndex>,
    registry: NamespaceRegistry,
    config: SearchConfig,
}

impl CorpusSearcher {
    pub fn new(index: Arc<dyn VectorIndex>, registry: NamespaceRegistry) -> Self {
        Self::with_config(index, registry, SearchConfig::default())
    }

    pub fn with_config(
        index: Arc<dyn VectorIndex>,
        registry: NamespaceRegistry,
        config: SearchConfig,
    ) -> Self {
        Self {
            index,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Find the single best match for `query_vector` across all registered
    /// namespaces, or `None` when no namespace produced a candidate.
    ///
    /// Candidates are compared by raw score with a strict `>`, so the
    /// first-seen candidate in registry order survives an exact tie.
    pub async fn search(&self, query_vector: &[f32]) -> Result<Option<MatchResult>, RagError> {
        let top_k = self.config.top_k;
        let lookups = self.registry.names().iter().map(|namespace| {
            let index = Arc::clone(&self.index);
            async move {
                match index.query(namespace, query_vector, top_k).await {
                    Ok(matches) => (namespace.as_str(), matches),
                    Err(err) => {
                        tracing::warn!(
                            namespace = %namespace,
                            error = %err,
                            "namespace query failed; skipping shard"
                        );
                        (namespace.as_str(), Vec::new())
                    }
                }
            }
        });

        // buffered() preserves input order, which keeps the reduction
        // deterministic regardless of which shard answers first.
        let per_namespace: Vec<(&str, Vec<MatchResult>)> = stream::iter(lookups)
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut best: Option<(&str, MatchResult)> = None;
        for (namespace, matches) in per_namespace {
            for candidate in matches {
                let improves = best
                    .as_ref()
                    .is_none_or(|(_, current)| candidate.score > current.score);
                if improves {
                    best = Some((namespace, candidate));
                }
            }
        }

        match best {
            Some((namespace, winner)) => {
                tracing::debug!(
                    namespace = %namespace,
                    id = %winner.id,
                    score = winner.score,
                    "corpus scan selected best match"
                );
                Ok(Some(winner))
            }
            None => {
                tracing::debug!(
                    namespaces = self.registry.len(),
                    "corpus scan found no candidates"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::index::{IndexedRecord, MemoryVectorIndex, RecordMetadata};

    fn unit_at_cos(score: f32) -> Vec<f32> {
        vec![score, (1.0 - score * score).sqrt()]
    }

    async fn seed(index: &MemoryVectorIndex, namespace: &str, id: &str, vector: Vec<f32>) {
        index
            .upsert(
                namespace,
                vec![IndexedRecord::new(id, vector, RecordMetadata::new(id))],
            )
            .await
            .unwrap();
    }

    /// Index double whose every query errors, as if the whole backend
    /// were unreachable.
    struct DownIndex;

    #[async_trait]
    impl VectorIndex for DownIndex {
        async fn query(
            &self,
            namespace: &str,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<MatchResult>, RagError> {
            Err(RagError::Index(format!("{namespace} unreachable")))
        }

        async fn upsert(
            &self,
            _namespace: &str,
            _records: Vec<IndexedRecord>,
        ) -> Result<(), RagError> {
            Ok(())
        }
    }

    #[test]
    fn corpus_registry_names_shards_in_order() {
        let registry = NamespaceRegistry::corpus(3);
        assert_eq!(registry.names(), ["ind_1", "ind_2", "ind_3"]);
        assert_eq!(NamespaceRegistry::default().len(), 42);
        assert!(NamespaceRegistry::corpus(0).is_empty());
    }

    #[test]
    fn single_registry_holds_one_namespace() {
        let registry = NamespaceRegistry::single("sess_abc");
        assert_eq!(registry.names(), ["sess_abc"]);
    }

    #[tokio::test]
    async fn picks_the_global_best_across_namespaces() {
        let index = Arc::new(MemoryVectorIndex::new());
        seed(&index, "ind_1", "low", unit_at_cos(0.4)).await;
        seed(&index, "ind_2", "high", unit_at_cos(0.95)).await;
        seed(&index, "ind_3", "mid", unit_at_cos(0.7)).await;

        let searcher = CorpusSearcher::new(index.clone(), NamespaceRegistry::corpus(3));
        let winner = searcher.search(&[1.0, 0.0]).await.unwrap().unwrap();
        assert_eq!(winner.id, "high");
    }

    #[tokio::test]
    async fn exact_tie_goes_to_the_earlier_namespace() {
        let index = Arc::new(MemoryVectorIndex::new());
        // ind_5 and ind_9 share an identical vector, so their scores are
        // bit-for-bit equal; ind_1 trails.
        let registry = NamespaceRegistry::from_names(["ind_1", "ind_5", "ind_9"]);
        seed(&index, "ind_1", "trailing", unit_at_cos(0.62)).await;
        seed(&index, "ind_5", "first-tied", unit_at_cos(0.91)).await;
        seed(&index, "ind_9", "second-tied", unit_at_cos(0.91)).await;

        let searcher = CorpusSearcher::new(index.clone(), registry);
        let winner = searcher.search(&[1.0, 0.0]).await.unwrap().unwrap();
        assert_eq!(winner.id, "first-tied");
    }

    #[tokio::test]
    async fn all_empty_namespaces_yield_none() {
        let index = Arc::new(MemoryVectorIndex::new());
        let searcher = CorpusSearcher::new(index, NamespaceRegistry::corpus(4));
        assert!(searcher.search(&[1.0, 0.0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn every_shard_erroring_yields_none_instead_of_an_error() {
        let searcher = CorpusSearcher::new(Arc::new(DownIndex), NamespaceRegistry::corpus(5));
        assert!(searcher.search(&[1.0, 0.0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_registry_yields_none() {
        let index = Arc::new(MemoryVectorIndex::new());
        let searcher = CorpusSearcher::new(index, NamespaceRegistry::from_names(Vec::<String>::new()));
        assert!(searcher.search(&[1.0, 0.0]).await.unwrap().is_none());
    }
}
