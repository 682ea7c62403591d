//! Vector index abstraction and implementations.
//!
//! The index is a namespace-partitioned store of embedding vectors with
//! attached metadata. Corpus shards (`ind_1`, `ind_2`, ...), the query
//! cache namespace (`q_ind`), and per-upload session namespaces
//! (`sess_<run>`) are all just namespaces of the same index.
//!
//! ```text
//! namespace "ind_7"
//! ┌────────────────────────────────────────────────────┐
//! │ id: "itat-2019-441-3"                              │
//! │ vector: [0.01, -0.33, ...]            (1024 dims)  │
//! │ metadata:                                          │
//! │   text:    "The assessee claimed deduction ..."    │
//! │   summary: ""                                      │
//! │   query:   null        (set on cached entries)     │
//! │   ...      arbitrary extra keys                    │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Two implementations ship with the crate:
//! - [`RemoteVectorIndex`]: REST data plane, used in production
//! - [`MemoryVectorIndex`]: in-process cosine scan, used in tests and demos
//!
//! Namespaces are lazy on both: querying one that has never been written
//! returns no matches rather than an error, and the first upsert creates it.

mod memory;
mod remote;

pub use memory::MemoryVectorIndex;
pub use remote::RemoteVectorIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RagError;

/// Metadata stored alongside a vector.
///
/// `text` is the retrievable payload. `summary` is reserved for a future
/// condensation pass and is written as an empty string during ingestion.
/// `query` is only present on query-cache entries and records the natural
/// language question that produced the entry. Anything else round-trips
/// through `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RecordMetadata {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A vector plus metadata, ready to be written to a namespace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl IndexedRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: RecordMetadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// A scored hit returned by a namespace query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: RecordMetadata,
}

/// Namespace-partitioned vector store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest records in `namespace`, best first.
    ///
    /// A namespace that has never been written yields an empty result.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, RagError>;

    /// Insert or replace records by id within `namespace`.
    async fn upsert(&self, namespace: &str, records: Vec<IndexedRecord>) -> Result<(), RagError>;
}
