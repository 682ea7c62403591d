//! Retrieval-augmented question answering over a sharded legal corpus.
//!
//! The crate implements the full pipeline between "user asks a question"
//! and "grounded answer text", including the upload path where a user
//! brings their own document:
//!
//! ```text
//!          question
//!             │
//!             ▼
//!   embeddings::Embedder (query mode)
//!             │
//!             ▼
//!      cache::QueryCache ──────hit──────────────┐
//!             │ miss                            │
//!             ▼                                 │
//!    search::CorpusSearcher                     │
//!      (ind_1 .. ind_N fan-out,                 │
//!       global best match)                      │
//!             │                                 │
//!      write-through to cache                   │
//!             │                                 ▼
//!             └────────────────────► answer::AnswerSynthesizer ──► answer
//!
//!   uploaded document ──► chunking::SentenceChunker
//!                              │
//!                              ▼
//!                    ingest::DocumentIngestor
//!               (paced passage batches, retries)
//!                              │
//!                              ▼
//!                  session namespace sess_<run>
//! ```
//!
//! [`service::RetrievalService`] wires the stages together behind three
//! operations: `retrieve`, `answer`, and `answer_with_document`. All
//! remote collaborators sit behind traits ([`embeddings::Embedder`],
//! [`index::VectorIndex`], [`answer::ChatModel`]), so the pipeline runs
//! unchanged against hosted services or in-process fakes.
//!
//! # Module guide
//!
//! - [`types`]: the [`RagError`] taxonomy
//! - [`config`]: engine tunables and remote endpoint settings
//! - [`chunking`]: sentence-respecting token-budgeted chunker
//! - [`embeddings`]: embedding gateway with query/passage asymmetry
//! - [`index`]: namespace-partitioned vector index clients
//! - [`cache`]: similarity cache for answered queries
//! - [`search`]: corpus-wide best-match scan
//! - [`ingest`]: paced, retried document ingestion
//! - [`answer`]: restricting prompt and completion client
//! - [`service`]: the facade assembling all of the above

pub mod answer;
pub mod cache;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod search;
pub mod service;
pub mod types;

pub use service::{
    AnswerOutcome, INGEST_FAILED_MESSAGE, NO_MATCH_MESSAGE, RetrievalService,
    RetrievalServiceBuilder,
};
pub use types::RagError;
