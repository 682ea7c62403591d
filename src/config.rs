//! Configuration for the retrieval engine and its remote collaborators.
//!
//! Two families live here:
//!
//! - **Engine tunables** ([`EngineConfig`] and its sub-configs) control the
//!   in-process pipeline: chunk budgets, cache acceptance, scan fan-out,
//!   ingestion pacing. All of them have working defaults, so
//!   `EngineConfig::default()` is a valid production setup.
//! - **Service endpoints** ([`EmbeddingServiceConfig`],
//!   [`VectorIndexServiceConfig`], [`ChatServiceConfig`]) describe the remote
//!   HTTP services. These require a base URL and an API key and are normally
//!   loaded once at startup via their `from_env` constructors.
//!
//! Environment variables are read through `dotenvy`, so a local `.env` file
//! works the same as real process environment.

use std::time::Duration;

use url::Url;

use crate::ingest::RetryPolicy;
use crate::search::NamespaceRegistry;
use crate::types::RagError;

fn env_var(name: &str) -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn required_env(name: &str) -> Result<String, RagError> {
    env_var(name).ok_or_else(|| RagError::Config(format!("environment variable {name} is not set")))
}

/// Resolve `path` against `base_url`, treating the base as a directory
/// whether or not it carries a trailing slash.
pub(crate) fn join_endpoint(base_url: &str, path: &str) -> Result<Url, RagError> {
    let mut base = Url::parse(base_url)
        .map_err(|err| RagError::Config(format!("invalid base url {base_url}: {err}")))?;
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path)
        .map_err(|err| RagError::Config(format!("invalid endpoint path {path}: {err}")))
}

/// Token budget for the sentence chunker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum tokens per chunk. A single sentence longer than this still
    /// becomes its own chunk; sentences are never split.
    pub max_tokens: usize,
}

impl ChunkerConfig {
    pub const DEFAULT_MAX_TOKENS: usize = 505;

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = if max_tokens == 0 {
            Self::DEFAULT_MAX_TOKENS
        } else {
            max_tokens
        };
        self
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Settings for the query cache namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Namespace that holds previously answered queries.
    pub namespace: String,
    /// How many cached candidates to retrieve per lookup.
    pub top_k: usize,
    /// Minimum similarity score for a cached entry to count as a hit.
    pub acceptance: f32,
}

impl CacheConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "q_ind";
    pub const DEFAULT_TOP_K: usize = 3;
    pub const DEFAULT_ACCEPTANCE: f32 = 0.8;

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_acceptance(mut self, acceptance: f32) -> Self {
        self.acceptance = acceptance;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            top_k: Self::DEFAULT_TOP_K,
            acceptance: Self::DEFAULT_ACCEPTANCE,
        }
    }
}

/// Settings for the corpus-wide namespace scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// How many candidates to retrieve from each namespace.
    pub top_k: usize,
    /// How many namespace queries may be in flight at once.
    pub concurrency: usize,
}

impl SearchConfig {
    pub const DEFAULT_TOP_K: usize = 3;
    pub const DEFAULT_CONCURRENCY: usize = 8;

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }
}

/// Pacing and retry settings for document ingestion.
///
/// Ingestion is deliberately sequential: embedding providers rate-limit
/// aggressively, so batches are paced with a fixed delay rather than fired
/// in parallel.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Chunks per embedding request.
    pub batch_size: usize,
    /// Pause between consecutive embedding batches.
    pub batch_delay: Duration,
    /// Backoff schedule for failed embedding or upsert calls.
    pub retry: RetryPolicy,
}

impl IngestConfig {
    pub const DEFAULT_BATCH_SIZE: usize = 96;
    pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(15);

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            batch_delay: Self::DEFAULT_BATCH_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Settings for grounded answer synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesizerConfig {
    /// Domain the assistant claims expertise in. Interpolated into the
    /// restricting prompt.
    pub specialty: String,
}

impl SynthesizerConfig {
    pub const DEFAULT_SPECIALTY: &'static str = "Indian tax law";

    #[must_use]
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = specialty.into();
        self
    }
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            specialty: Self::DEFAULT_SPECIALTY.to_string(),
        }
    }
}

/// Aggregate configuration for [`RetrievalService`](crate::service::RetrievalService).
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub chunker: ChunkerConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub ingest: IngestConfig,
    pub synthesizer: SynthesizerConfig,
    /// Corpus namespaces visited by the scan, in tie-break priority order.
    pub registry: NamespaceRegistry,
}

impl EngineConfig {
    /// Build a config from the process environment, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables:
    /// - `LEXSMITH_CORPUS_NAMESPACES`: comma-separated namespace list
    ///   (takes precedence over the shard count)
    /// - `LEXSMITH_CORPUS_SHARDS`: number of `ind_*` corpus shards
    /// - `LEXSMITH_CACHE_NAMESPACE`: query cache namespace
    /// - `LEXSMITH_SPECIALTY`: assistant specialty for the prompt
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(names) = env_var("LEXSMITH_CORPUS_NAMESPACES") {
            config.registry = NamespaceRegistry::from_names(
                names.split(',').map(str::trim).filter(|name| !name.is_empty()),
            );
        } else if let Some(shards) = env_var("LEXSMITH_CORPUS_SHARDS")
            .and_then(|raw| raw.parse::<usize>().ok())
        {
            config.registry = NamespaceRegistry::corpus(shards);
        }

        if let Some(namespace) = env_var("LEXSMITH_CACHE_NAMESPACE") {
            config.cache.namespace = namespace;
        }
        if let Some(specialty) = env_var("LEXSMITH_SPECIALTY") {
            config.synthesizer.specialty = specialty;
        }

        config
    }

    #[must_use]
    pub fn with_registry(mut self, registry: NamespaceRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: SynthesizerConfig) -> Self {
        self.synthesizer = synthesizer;
        self
    }
}

/// Connection settings for the remote embedding service.
#[derive(Clone, Debug)]
pub struct EmbeddingServiceConfig {
    pub base_url: String,
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Expected vector dimensionality.
    pub dims: usize,
    pub timeout: Duration,
}

impl EmbeddingServiceConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.pinecone.io";
    pub const DEFAULT_MODEL: &'static str = "multilingual-e5-large";
    pub const DEFAULT_DIMS: usize = 1024;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            dims: Self::DEFAULT_DIMS,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load from `LEXSMITH_EMBEDDING_URL`, `LEXSMITH_EMBEDDING_API_KEY`,
    /// and `LEXSMITH_EMBEDDING_MODEL`. Only the API key is mandatory.
    pub fn from_env() -> Result<Self, RagError> {
        let base_url = env_var("LEXSMITH_EMBEDDING_URL")
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let api_key = required_env("LEXSMITH_EMBEDDING_API_KEY")?;
        let mut config = Self::new(base_url, api_key);
        if let Some(model) = env_var("LEXSMITH_EMBEDDING_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = dims.max(1);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Connection settings for the remote vector index.
#[derive(Clone, Debug)]
pub struct VectorIndexServiceConfig {
    /// Data-plane host of the index, e.g. `https://my-index-abc123.svc.pinecone.io`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl VectorIndexServiceConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load from `LEXSMITH_INDEX_URL` and `LEXSMITH_INDEX_API_KEY`. Both
    /// are mandatory; there is no sensible default index host.
    pub fn from_env() -> Result<Self, RagError> {
        Ok(Self::new(
            required_env("LEXSMITH_INDEX_URL")?,
            required_env("LEXSMITH_INDEX_API_KEY")?,
        ))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Connection settings for the OpenAI-compatible chat completion service.
#[derive(Clone, Debug)]
pub struct ChatServiceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature. Kept low so answers stay close to the context.
    pub temperature: f64,
    pub timeout: Duration,
}

impl ChatServiceConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_MODEL: &'static str = "llama3-70b-8192";
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;
    pub const DEFAULT_TEMPERATURE: f64 = 0.2;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load from `LEXSMITH_CHAT_URL`, `LEXSMITH_CHAT_API_KEY`, and
    /// `LEXSMITH_CHAT_MODEL`. Only the API key is mandatory.
    pub fn from_env() -> Result<Self, RagError> {
        let base_url =
            env_var("LEXSMITH_CHAT_URL").unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let api_key = required_env("LEXSMITH_CHAT_API_KEY")?;
        let mut config = Self::new(base_url, api_key);
        if let Some(model) = env_var("LEXSMITH_CHAT_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
