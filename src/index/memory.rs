//! In-process vector index.
//!
//! Brute-force cosine scan over namespace-partitioned records. Fast enough
//! for demos and tests, and the reference for how match ordering is
//! supposed to behave.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::RagError;

use super::{IndexedRecord, MatchResult, VectorIndex};

/// Thread-safe in-memory [`VectorIndex`].
#[derive(Default)]
pub struct MemoryVectorIndex {
    // BTreeMap keyed by record id keeps scans deterministic.
    namespaces: RwLock<HashMap<String, BTreeMap<String, IndexedRecord>>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored in `namespace`.
    pub fn record_count(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read();
        namespaces.get(namespace).map_or(0, BTreeMap::len)
    }

    /// Names of all namespaces that have received at least one upsert.
    pub fn namespace_names(&self) -> Vec<String> {
        let namespaces = self.namespaces.read();
        let mut names: Vec<String> = namespaces.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Cosine similarity in `[-1, 1]`, or 0.0 when either vector has zero
/// magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensionality mismatch");
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, RagError> {
        let namespaces = self.namespaces.read();
        let Some(records) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<MatchResult> = records
            .values()
            .map(|record| MatchResult {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn upsert(&self, namespace: &str, records: Vec<IndexedRecord>) -> Result<(), RagError> {
        let mut namespaces = self.namespaces.write();
        let entry = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entry.insert(record.id.clone(), record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecordMetadata;

    fn record(id: &str, vector: Vec<f32>, text: &str) -> IndexedRecord {
        IndexedRecord::new(id, vector, RecordMetadata::new(text))
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -0.5, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_negative_one() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero_instead_of_nan() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn unwritten_namespace_queries_empty() {
        let index = MemoryVectorIndex::new();
        let matches = index.query("ind_9", &[1.0, 0.0], 3).await.unwrap();
        assert!(matches.is_empty());
        assert_eq!(index.record_count("ind_9"), 0);
    }

    #[tokio::test]
    async fn matches_come_back_best_first_and_truncated() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(
                "ind_1",
                vec![
                    record("far", vec![0.0, 1.0], "far text"),
                    record("near", vec![1.0, 0.05], "near text"),
                    record("exact", vec![1.0, 0.0], "exact text"),
                ],
            )
            .await
            .unwrap();

        let matches = index.query("ind_1", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "exact");
        assert_eq!(matches[1].id, "near");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn upsert_replaces_records_by_id() {
        let index = MemoryVectorIndex::new();
        index
            .upsert("q_ind", vec![record("r1", vec![1.0, 0.0], "old")])
            .await
            .unwrap();
        index
            .upsert("q_ind", vec![record("r1", vec![1.0, 0.0], "new")])
            .await
            .unwrap();

        assert_eq!(index.record_count("q_ind"), 1);
        let matches = index.query("q_ind", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(matches[0].metadata.text, "new");
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let index = MemoryVectorIndex::new();
        index
            .upsert("ind_1", vec![record("a", vec![1.0, 0.0], "shard one")])
            .await
            .unwrap();
        index
            .upsert("ind_2", vec![record("b", vec![1.0, 0.0], "shard two")])
            .await
            .unwrap();

        let matches = index.query("ind_2", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");
        assert_eq!(index.namespace_names(), vec!["ind_1", "ind_2"]);
    }
}
