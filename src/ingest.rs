//! Document ingestion into per-upload session namespaces.
//!
//! An uploaded document is chunked, embedded in passage mode, and written
//! to a fresh namespace named `sess_<run>` where `run` is a random run id.
//! Record ids are `<run>-<seq>` with `seq` numbering chunks from zero in
//! document order, so a record id always identifies both its upload and
//! its position.
//!
//! Embedding batches run strictly one after another with a fixed pause
//! between them. The hosted embedding tier rate-limits by requests per
//! minute; parallelizing the batches trips the limiter and fails the whole
//! upload, so the pacing here is load-bearing, not an optimization target.
//! Each embedding call and the final upsert retry on failure with
//! exponential backoff and a small random jitter.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::chunking::SentenceChunker;
use crate::config::IngestConfig;
use crate::embeddings::{Embedder, InputKind};
use crate::index::{IndexedRecord, RecordMetadata, VectorIndex};
use crate::types::RagError;

/// Exponential backoff schedule for remote calls during ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to every delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(50);

    /// Delay to wait after the failed attempt numbered `attempt`
    /// (zero-based). Doubling is capped so pathological attempt counts
    /// cannot overflow.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let capped = attempt.min(6);
        let backoff = self.base_delay.saturating_mul(1 << capped);
        if self.max_jitter.is_zero() {
            backoff
        } else {
            backoff + self.max_jitter.mul_f64(rand::random::<f64>())
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_jitter: Self::DEFAULT_MAX_JITTER,
        }
    }
}

/// Summary of a completed ingestion run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestReport {
    /// Session namespace the document landed in.
    pub namespace: String,
    /// Number of chunks written.
    pub chunks: usize,
}

/// Chunks, embeds, and indexes uploaded documents.
pub struct DocumentIngestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: SentenceChunker,
    config: IngestConfig,
}

impl DocumentIngestor {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self::with_config(embedder, index, SentenceChunker::default(), IngestConfig::default())
    }

    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunker: SentenceChunker,
        config: IngestConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            config,
        }
    }

    /// Ingest `document` into a fresh session namespace.
    ///
    /// Fails with [`RagError::Ingestion`] when the document yields no
    /// chunks or when a remote call is still failing after the retry
    /// budget is spent.
    pub async fn ingest(&self, document: &str) -> Result<IngestReport, RagError> {
        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Err(RagError::Ingestion("document produced no chunks".into()));
        }

        let run_id = Uuid::new_v4().simple().to_string();
        let namespace = format!("sess_{run_id}");
        let ingested_at = Utc::now().to_rfc3339();
        tracing::info!(
            namespace = %namespace,
            chunks = chunks.len(),
            batches = chunks.len().div_ceil(self.config.batch_size),
            "ingesting document"
        );

        let mut records = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(self.config.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            let vectors = self.embed_batch(batch, batch_index).await?;
            for (offset, (chunk, vector)) in batch.iter().zip(vectors).enumerate() {
                let seq = batch_index * self.config.batch_size + offset;
                let metadata = RecordMetadata::new(chunk.clone())
                    .with_summary("")
                    .with_extra("ingested_at", Value::String(ingested_at.clone()));
                records.push(IndexedRecord::new(format!("{run_id}-{seq}"), vector, metadata));
            }
        }

        self.upsert_records(&namespace, records).await?;
        tracing::info!(namespace = %namespace, chunks = chunks.len(), "document ingested");
        Ok(IngestReport {
            namespace,
            chunks: chunks.len(),
        })
    }

    async fn embed_batch(
        &self,
        batch: &[String],
        batch_index: usize,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let mut attempt = 0u32;
        loop {
            match self.embedder.embed(batch, InputKind::Passage).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.retry.max_attempts {
                        return Err(RagError::Ingestion(format!(
                            "embedding batch {batch_index} failed after {attempt} attempts: {err}"
                        )));
                    }
                    let delay = self.config.retry.backoff_delay(attempt - 1);
                    tracing::warn!(
                        batch = batch_index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "embedding batch failed; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn upsert_records(
        &self,
        namespace: &str,
        records: Vec<IndexedRecord>,
    ) -> Result<(), RagError> {
        let mut attempt = 0u32;
        loop {
            match self.index.upsert(namespace, records.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.retry.max_attempts {
                        return Err(RagError::Ingestion(format!(
                            "upsert into {namespace} failed after {attempt} attempts: {err}"
                        )));
                    }
                    let delay = self.config.retry.backoff_delay(attempt - 1);
                    tracing::warn!(
                        namespace = %namespace,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "upsert failed; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
