//! HTTP client for the hosted embedding inference API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{EmbeddingServiceConfig, join_endpoint};
use crate::types::RagError;

use super::{Embedder, InputKind};

/// Embedder backed by the inference REST endpoint.
///
/// Sends one `POST /embed` per batch with the configured model and the
/// retrieval mode in `parameters.input_type`. The caller is responsible
/// for batching and pacing; this client performs exactly one request per
/// [`Embedder::embed`] call.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    dims: usize,
}

impl RemoteEmbedder {
    pub fn new(config: EmbeddingServiceConfig) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(err.to_string()))?;
        let endpoint = join_endpoint(&config.base_url, "embed")?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
            dims: config.dims,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    inputs: &'a [String],
    parameters: EmbedParameters<'a>,
}

#[derive(Serialize)]
struct EmbedParameters<'a> {
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedVector>,
}

#[derive(Deserialize)]
struct EmbedVector {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String], kind: InputKind) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            inputs: texts,
            parameters: EmbedParameters {
                input_type: kind.as_str(),
            },
        };
        tracing::debug!(batch = texts.len(), kind = %kind, "requesting embeddings");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "embed endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        if parsed.data.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, service returned {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|vector| vector.values).collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_malformed_base_urls() {
        let config = EmbeddingServiceConfig::new("not a url", "key");
        assert!(matches!(RemoteEmbedder::new(config), Err(RagError::Config(_))));
    }

    #[test]
    fn reports_configured_dimensionality() {
        let config = EmbeddingServiceConfig::new("https://api.example.com", "key").with_dims(256);
        let embedder = RemoteEmbedder::new(config).unwrap();
        assert_eq!(embedder.dims(), 256);
    }
}
