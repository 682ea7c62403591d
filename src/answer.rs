//! Grounded answer synthesis.
//!
//! Takes retrieved context and a question, builds a restricting prompt,
//! and asks an OpenAI-compatible chat completion service for the answer.
//! The prompt instructs the model to use only the supplied context and to
//! admit when the context is insufficient, which is what keeps answers
//! grounded in the corpus instead of the model's own training data.
//!
//! Synthesis never fails the request: when the completion service errors,
//! the failure is folded into the answer text itself so the caller still
//! gets a well-formed response.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::{ChatServiceConfig, SynthesizerConfig, join_endpoint};
use crate::index::MatchResult;
use crate::types::RagError;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions based only on the provided context.";

/// Chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion with a system message and a user message,
    /// returning the assistant's reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError>;
}

/// Where the grounding context comes from.
#[derive(Clone, Debug)]
pub enum ContextSource {
    /// Already-resolved context text, e.g. a cache hit or corpus winner.
    RawText(String),
    /// Matches from a namespace search, used by the upload flow.
    Matches(Vec<MatchResult>),
}

impl ContextSource {
    /// Flatten into context blocks. Raw text is a single block; matches
    /// contribute their non-empty texts in order.
    pub fn into_blocks(self) -> Vec<String> {
        match self {
            ContextSource::RawText(text) => vec![text],
            ContextSource::Matches(matches) => matches
                .into_iter()
                .map(|m| m.metadata.text)
                .filter(|text| !text.is_empty())
                .collect(),
        }
    }
}

/// Builds prompts and runs the completion call.
pub struct AnswerSynthesizer {
    chat: Arc<dyn ChatModel>,
    config: SynthesizerConfig,
}

impl AnswerSynthesizer {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self::with_config(chat, SynthesizerConfig::default())
    }

    pub fn with_config(chat: Arc<dyn ChatModel>, config: SynthesizerConfig) -> Self {
        Self { chat, config }
    }

    /// Produce an answer for `query` grounded in `source`.
    ///
    /// A completion failure degrades to an `Error generating response:`
    /// message rather than propagating.
    pub async fn synthesize(&self, query: &str, source: ContextSource) -> String {
        let blocks = source.into_blocks();
        let context = blocks.join("\n\n");
        let prompt = self.build_prompt(query, &context);

        match self.chat.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "synthesis degraded to an error message");
                format!("Error generating response: {err}")
            }
        }
    }

    fn build_prompt(&self, query: &str, context: &str) -> String {
        let specialty = &self.config.specialty;
        format!(
            "You are a helpful assistant specialized in {specialty}. \
             Use ONLY the following context to answer the question.\n\
             If you don't have enough information to answer this question, \
             say \"I don't have enough information to answer this question.\"\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question: {query}\n\
             \n\
             Answer:"
        )
    }
}

/// [`ChatModel`] over an OpenAI-compatible `POST /chat/completions`
/// endpoint.
pub struct RemoteChatModel {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl RemoteChatModel {
    pub fn new(config: ChatServiceConfig) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: join_endpoint(&config.base_url, "chat/completions")?,
            api_key: config.api_key,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for RemoteChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| RagError::Generation(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Generation(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| RagError::Generation(err.to_string()))?;
        let content = payload
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                RagError::Generation("completion response had no message content".into())
            })?;
        Ok(content.to_string())
    }
}
