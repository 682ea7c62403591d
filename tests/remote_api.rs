//! Wire-contract tests for the three remote clients.
//!
//! Each test stands up a local mock server and checks both directions of
//! the contract: the request body the client must send, and how the
//! client maps responses (including failures) back into crate types.

use httpmock::prelude::*;
use serde_json::json;

use lexsmith::answer::{ChatModel, RemoteChatModel};
use lexsmith::config::{ChatServiceConfig, EmbeddingServiceConfig, VectorIndexServiceConfig};
use lexsmith::embeddings::{Embedder, InputKind, RemoteEmbedder};
use lexsmith::index::{IndexedRecord, RecordMetadata, RemoteVectorIndex, VectorIndex};
use lexsmith::types::RagError;

fn embedder_for(server: &MockServer) -> RemoteEmbedder {
    RemoteEmbedder::new(EmbeddingServiceConfig::new(server.base_url(), "embed-key")).unwrap()
}

fn index_for(server: &MockServer) -> RemoteVectorIndex {
    RemoteVectorIndex::new(VectorIndexServiceConfig::new(server.base_url(), "index-key")).unwrap()
}

fn chat_for(server: &MockServer) -> RemoteChatModel {
    RemoteChatModel::new(ChatServiceConfig::new(server.base_url(), "sk-test")).unwrap()
}

#[tokio::test]
async fn embedder_sends_model_inputs_and_passage_mode() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embed")
                .header("api-key", "embed-key")
                .json_body_partial(
                    json!({
                        "model": "multilingual-e5-large",
                        "inputs": ["first chunk", "second chunk"],
                        "parameters": { "input_type": "passage" }
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({
                "data": [
                    { "values": [0.25, -0.5] },
                    { "values": [0.5, 0.75] }
                ]
            }));
        })
        .await;

    let embedder = embedder_for(&server);
    let vectors = embedder
        .embed(
            &["first chunk".to_string(), "second chunk".to_string()],
            InputKind::Passage,
        )
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![0.25, -0.5], vec![0.5, 0.75]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedder_tags_queries_with_query_mode() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embed")
                .json_body_partial(json!({ "parameters": { "input_type": "query" } }).to_string());
            then.status(200)
                .json_body(json!({ "data": [ { "values": [1.0, 0.0] } ] }));
        })
        .await;

    let embedder = embedder_for(&server);
    let vector = embedder
        .embed_one("what does section 80C allow?", InputKind::Query)
        .await
        .unwrap();

    assert_eq!(vector, vec![1.0, 0.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedder_rejects_vector_count_mismatches() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({ "data": [ { "values": [1.0] } ] }));
        })
        .await;

    let embedder = embedder_for(&server);
    let err = embedder
        .embed(&["a".to_string(), "b".to_string()], InputKind::Passage)
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Embedding(_)));
    assert!(err.to_string().contains("expected 2 vectors"));
}

#[tokio::test]
async fn embedder_maps_http_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(429).body("rate limited");
        })
        .await;

    let embedder = embedder_for(&server);
    let err = embedder
        .embed(&["a".to_string()], InputKind::Passage)
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Embedding(_)));
    let message = err.to_string();
    assert!(message.contains("429"));
    assert!(message.contains("rate limited"));
}

#[tokio::test]
async fn embedder_skips_the_network_for_empty_batches() {
    let server = MockServer::start_async().await;
    // No mock is registered; any request would fail the test with a 404.
    let embedder = embedder_for(&server);
    let vectors = embedder.embed(&[], InputKind::Passage).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn index_query_posts_the_data_plane_contract() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/query")
                .header("api-key", "index-key")
                .json_body_partial(
                    json!({
                        "namespace": "ind_7",
                        "vector": [1.0, 0.0],
                        "topK": 3,
                        "includeValues": false,
                        "includeMetadata": true
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({
                "matches": [
                    {
                        "id": "rec-a",
                        "score": 0.92,
                        "metadata": { "text": "winning passage", "source": "itat" }
                    },
                    {
                        "id": "rec-b",
                        "score": 0.41,
                        "metadata": { "text": "runner up" }
                    }
                ]
            }));
        })
        .await;

    let index = index_for(&server);
    let matches = index.query("ind_7", &[1.0, 0.0], 3).await.unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "rec-a");
    assert!((matches[0].score - 0.92).abs() < 1e-6);
    assert_eq!(matches[0].metadata.text, "winning passage");
    assert_eq!(matches[0].metadata.extra["source"], "itat");
    mock.assert_async().await;
}

#[tokio::test]
async fn index_query_tolerates_a_missing_matches_field() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/query");
            then.status(200).json_body(json!({}));
        })
        .await;

    let index = index_for(&server);
    let matches = index.query("ind_41", &[1.0, 0.0], 3).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn index_upsert_posts_records_under_the_values_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vectors/upsert")
                .header("api-key", "index-key")
                .json_body_partial(
                    json!({
                        "namespace": "sess_abc",
                        "vectors": [
                            {
                                "id": "run-0",
                                "values": [0.5, -0.25],
                                "metadata": { "text": "chunk text", "summary": "" }
                            }
                        ]
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({ "upsertedCount": 1 }));
        })
        .await;

    let index = index_for(&server);
    let record = IndexedRecord::new(
        "run-0",
        vec![0.5, -0.25],
        RecordMetadata::new("chunk text").with_summary(""),
    );
    index.upsert("sess_abc", vec![record]).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn index_upsert_skips_the_network_for_empty_record_sets() {
    let server = MockServer::start_async().await;
    let index = index_for(&server);
    index.upsert("sess_abc", Vec::new()).await.unwrap();
}

#[tokio::test]
async fn index_failures_carry_status_and_namespace() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/query");
            then.status(500).body("shard unavailable");
        })
        .await;

    let index = index_for(&server);
    let err = index.query("ind_13", &[1.0], 3).await.unwrap_err();

    assert!(matches!(err, RagError::Index(_)));
    let message = err.to_string();
    assert!(message.contains("ind_13"));
    assert!(message.contains("500"));
}

#[tokio::test]
async fn chat_posts_an_openai_compatible_completion() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body_partial(
                    json!({
                        "model": "llama3-70b-8192",
                        "temperature": 0.2,
                        "max_tokens": 1024,
                        "messages": [
                            { "role": "system", "content": "stay grounded" },
                            { "role": "user", "content": "what is STT?" }
                        ]
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "A transaction levy." } }
                ]
            }));
        })
        .await;

    let chat = chat_for(&server);
    let answer = chat.complete("stay grounded", "what is STT?").await.unwrap();

    assert_eq!(answer, "A transaction levy.");
    mock.assert_async().await;
}

#[tokio::test]
async fn chat_maps_http_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("upstream exploded");
        })
        .await;

    let chat = chat_for(&server);
    let err = chat.complete("sys", "user").await.unwrap_err();

    assert!(matches!(err, RagError::Generation(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn chat_rejects_contentless_responses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let chat = chat_for(&server);
    let err = chat.complete("sys", "user").await.unwrap_err();

    assert!(matches!(err, RagError::Generation(_)));
    assert!(err.to_string().contains("no message content"));
}
