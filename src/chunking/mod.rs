//! Sentence-respecting text chunking.
//!
//! Splits a document into sentences, then packs consecutive sentences into
//! chunks under a token budget. Sentences are never split across chunks: a
//! sentence that alone exceeds the budget becomes its own oversized chunk
//! rather than being truncated. Chunk text is the token sequence joined
//! with single spaces, so original whitespace is normalized but no token
//! is ever lost or reordered.
//!
//! # Examples
//!
//! ```rust,ignore
//! use lexsmith::chunking::SentenceChunker;
//! use lexsmith::config::ChunkerConfig;
//!
//! let chunker = SentenceChunker::new(ChunkerConfig::default().with_max_tokens(120));
//! let chunks = chunker.chunk(&judgment_text);
//! ```

pub mod segmenter;
pub mod tokenizer;

use crate::config::ChunkerConfig;

/// Packs sentences into token-budgeted chunks.
#[derive(Clone, Debug)]
pub struct SentenceChunker {
    config: ChunkerConfig,
}

impl SentenceChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn max_tokens(&self) -> usize {
        self.config.max_tokens
    }

    /// Split `document` into chunks.
    ///
    /// Every chunk is either within the token budget or a single sentence
    /// that exceeds it on its own. An empty or whitespace-only document
    /// yields no chunks.
    pub fn chunk(&self, document: &str) -> Vec<String> {
        let max_tokens = self.max_tokens();
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for sentence in segmenter::sentences(document) {
            let sentence_tokens = tokenizer::tokens(sentence);
            if sentence_tokens.is_empty() {
                continue;
            }
            if !current.is_empty() && current.len() + sentence_tokens.len() > max_tokens {
                chunks.push(current.join(" "));
                current = sentence_tokens;
            } else {
                current.extend(sentence_tokens);
            }
        }
        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        tracing::debug!(
            chunks = chunks.len(),
            max_tokens,
            "chunked document into sentence-aligned chunks"
        );
        chunks
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}
