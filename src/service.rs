//! Request-level facade over the retrieval pipeline.
//!
//! [`RetrievalService`] owns one configured instance of every pipeline
//! stage and exposes the three operations an API layer needs:
//!
//! - [`retrieve`](RetrievalService::retrieve): query to best context text
//! - [`answer`](RetrievalService::answer): query to synthesized answer
//! - [`answer_with_document`](RetrievalService::answer_with_document):
//!   upload-and-ask against a fresh session namespace
//!
//! The remote collaborators (embedder, index, chat model) are injected as
//! trait objects, so the same service runs against hosted services in
//! production and against in-process fakes in tests and demos.

use std::sync::Arc;

use serde::Serialize;

use crate::answer::{AnswerSynthesizer, ChatModel, ContextSource};
use crate::cache::{CacheOutcome, QueryCache};
use crate::chunking::SentenceChunker;
use crate::config::{EngineConfig, SearchConfig};
use crate::embeddings::{Embedder, InputKind};
use crate::index::VectorIndex;
use crate::ingest::DocumentIngestor;
use crate::search::{CorpusSearcher, NamespaceRegistry};
use crate::types::RagError;

/// Returned when no namespace produced any candidate for a query.
pub const NO_MATCH_MESSAGE: &str = "No relevant information found in any namespace.";

/// Returned when an uploaded document could not be ingested.
pub const INGEST_FAILED_MESSAGE: &str = "Failed to upsert the document, please try again.";

/// Response payload of the answer operations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub query: String,
    /// Context the answer was grounded in, or a sentinel message when
    /// retrieval found nothing.
    pub context: String,
    pub answer: String,
}

/// End-to-end retrieval question answering over a sharded legal corpus.
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    cache: QueryCache,
    searcher: CorpusSearcher,
    ingestor: DocumentIngestor,
    synthesizer: AnswerSynthesizer,
    search_config: SearchConfig,
}

impl RetrievalService {
    pub fn builder() -> RetrievalServiceBuilder {
        RetrievalServiceBuilder::default()
    }

    fn assemble(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        config: EngineConfig,
    ) -> Self {
        let EngineConfig {
            chunker,
            cache,
            search,
            ingest,
            synthesizer,
            registry,
        } = config;

        Self {
            cache: QueryCache::with_config(Arc::clone(&index), cache),
            searcher: CorpusSearcher::with_config(
                Arc::clone(&index),
                registry,
                search.clone(),
            ),
            ingestor: DocumentIngestor::with_config(
                Arc::clone(&embedder),
                Arc::clone(&index),
                SentenceChunker::new(chunker),
                ingest,
            ),
            synthesizer: AnswerSynthesizer::with_config(chat, synthesizer),
            search_config: search,
            embedder,
            index,
        }
    }

    /// Fetch the best available context text for `query`.
    ///
    /// Consults the query cache first; on a miss, scans the corpus and
    /// writes the winner back to the cache before returning its text.
    /// Returns [`NO_MATCH_MESSAGE`] when the whole corpus has nothing.
    pub async fn retrieve(&self, query: &str) -> Result<String, RagError> {
        Ok(self
            .best_context(query)
            .await?
            .unwrap_or_else(|| NO_MATCH_MESSAGE.to_string()))
    }

    /// Cache-then-scan retrieval. `None` means no namespace produced a
    /// candidate; a stored passage whose text happens to equal
    /// [`NO_MATCH_MESSAGE`] still comes back as `Some`.
    async fn best_context(&self, query: &str) -> Result<Option<String>, RagError> {
        let query_vector = self.embedder.embed_one(query, InputKind::Query).await?;

        match self.cache.lookup(&query_vector).await {
            Ok(CacheOutcome::Hit { text, score }) => {
                tracing::info!(score, "served from query cache");
                return Ok(Some(text));
            }
            Ok(CacheOutcome::Miss) => {}
            Err(err) => {
                // A broken cache namespace must not take down retrieval.
                tracing::warn!(error = %err, "cache lookup failed; treating as miss");
            }
        }

        match self.searcher.search(&query_vector).await? {
            Some(winner) => {
                self.cache.store(&winner, &query_vector, query).await?;
                Ok(Some(winner.metadata.text))
            }
            None => Ok(None),
        }
    }

    /// Answer `query` from the corpus.
    ///
    /// When retrieval comes back empty the sentinel is returned as the
    /// answer without invoking the completion service; there is no context
    /// to ground a generation in.
    pub async fn answer(&self, query: &str) -> Result<AnswerOutcome, RagError> {
        match self.best_context(query).await? {
            Some(context) => {
                let answer = self
                    .synthesizer
                    .synthesize(query, ContextSource::RawText(context.clone()))
                    .await;
                Ok(AnswerOutcome {
                    query: query.to_string(),
                    context,
                    answer,
                })
            }
            None => Ok(AnswerOutcome {
                query: query.to_string(),
                context: NO_MATCH_MESSAGE.to_string(),
                answer: NO_MATCH_MESSAGE.to_string(),
            }),
        }
    }

    /// Ingest `document` into a fresh session namespace, then answer
    /// `query` against that namespace only.
    ///
    /// Session queries never touch the query cache: the namespace is
    /// private to this upload and caching its matches would leak them
    /// into unrelated requests. Ingestion failure degrades to
    /// [`INGEST_FAILED_MESSAGE`] instead of erroring, so the caller can
    /// always present a response.
    pub async fn answer_with_document(
        &self,
        query: &str,
        document: &str,
    ) -> Result<AnswerOutcome, RagError> {
        let report = match self.ingestor.ingest(document).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "document ingestion failed");
                return Ok(AnswerOutcome {
                    query: query.to_string(),
                    context: String::new(),
                    answer: INGEST_FAILED_MESSAGE.to_string(),
                });
            }
        };

        let query_vector = self.embedder.embed_one(query, InputKind::Query).await?;
        let session_searcher = CorpusSearcher::with_config(
            Arc::clone(&self.index),
            NamespaceRegistry::single(&report.namespace),
            self.search_config.clone(),
        );

        match session_searcher.search(&query_vector).await? {
            Some(winner) => {
                let context = winner.metadata.text.clone();
                let answer = self
                    .synthesizer
                    .synthesize(query, ContextSource::Matches(vec![winner]))
                    .await;
                Ok(AnswerOutcome {
                    query: query.to_string(),
                    context,
                    answer,
                })
            }
            None => Ok(AnswerOutcome {
                query: query.to_string(),
                context: NO_MATCH_MESSAGE.to_string(),
                answer: NO_MATCH_MESSAGE.to_string(),
            }),
        }
    }
}

/// Builder for [`RetrievalService`].
///
/// The embedder, index, and chat model are required; the engine config
/// defaults to production settings when not supplied.
#[derive(Default)]
pub struct RetrievalServiceBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    chat: Option<Arc<dyn ChatModel>>,
    config: Option<EngineConfig>,
}

impl RetrievalServiceBuilder {
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the service.
    ///
    /// # Panics
    /// Panics when the embedder, index, or chat model is missing. Use
    /// [`try_build`](Self::try_build) for a fallible variant.
    pub fn build(self) -> RetrievalService {
        self.try_build()
            .expect("RetrievalService requires an embedder, a vector index, and a chat model")
    }

    pub fn try_build(self) -> Option<RetrievalService> {
        let embedder = self.embedder?;
        let index = self.index?;
        let chat = self.chat?;
        let config = self.config.unwrap_or_default();
        Some(RetrievalService::assemble(embedder, index, chat, config))
    }
}
