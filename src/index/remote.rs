//! HTTP client for the hosted vector index data plane.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{VectorIndexServiceConfig, join_endpoint};
use crate::types::RagError;

use super::{IndexedRecord, MatchResult, RecordMetadata, VectorIndex};

/// Index client speaking the `POST /query` and `POST /vectors/upsert`
/// data-plane contract.
pub struct RemoteVectorIndex {
    client: reqwest::Client,
    query_endpoint: Url,
    upsert_endpoint: Url,
    api_key: String,
}

impl RemoteVectorIndex {
    pub fn new(config: VectorIndexServiceConfig) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| RagError::Config(err.to_string()))?;
        Ok(Self {
            client,
            query_endpoint: join_endpoint(&config.base_url, "query")?,
            upsert_endpoint: join_endpoint(&config.base_url, "vectors/upsert")?,
            api_key: config.api_key,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<MatchResult>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    namespace: &'a str,
    vectors: Vec<WireVector<'a>>,
}

#[derive(Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, RagError> {
        let request = QueryRequest {
            namespace,
            vector,
            top_k,
            include_values: false,
            include_metadata: true,
        };

        let response = self
            .client
            .post(self.query_endpoint.clone())
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Index(format!(
                "query against {namespace} returned {status}: {body}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?;
        tracing::debug!(
            namespace = %namespace,
            matches = parsed.matches.len(),
            "index query complete"
        );
        Ok(parsed.matches)
    }

    async fn upsert(&self, namespace: &str, records: Vec<IndexedRecord>) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            namespace,
            vectors: records
                .iter()
                .map(|record| WireVector {
                    id: &record.id,
                    values: &record.vector,
                    metadata: &record.metadata,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.upsert_endpoint.clone())
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Index(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Index(format!(
                "upsert into {namespace} returned {status}: {body}"
            )));
        }

        tracing::debug!(
            namespace = %namespace,
            records = records.len(),
            "index upsert complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_derives_both_endpoints() {
        let config = VectorIndexServiceConfig::new("https://idx-abc.svc.example.io", "key");
        let index = RemoteVectorIndex::new(config).unwrap();
        assert_eq!(index.query_endpoint.as_str(), "https://idx-abc.svc.example.io/query");
        assert_eq!(
            index.upsert_endpoint.as_str(),
            "https://idx-abc.svc.example.io/vectors/upsert"
        );
    }

    #[test]
    fn query_request_uses_camel_case_keys() {
        let request = QueryRequest {
            namespace: "ind_1",
            vector: &[0.5, 0.5],
            top_k: 3,
            include_values: false,
            include_metadata: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["topK"], 3);
        assert_eq!(value["includeMetadata"], true);
        assert_eq!(value["includeValues"], false);
    }
}
