//! Local Pipeline: Retrieval and Answering Without Remote Services
//!
//! This demonstration runs the whole retrieval pipeline in-process: a
//! deterministic hash embedder and an in-memory vector index stand in for
//! the hosted embedding and index services, and a scripted chat model
//! stands in for the completion endpoint.
//!
//! What You'll Learn:
//! 1. Wiring: assembling `RetrievalService` from injected collaborators
//! 2. Cold retrieval: the fan-out scan across corpus namespaces
//! 3. Write-through caching: why the second lookup never rescans
//! 4. Grounded answers: how retrieved context reaches the chat model
//! 5. Sessions: upload-and-ask against a private namespace
//!
//! Running This Demo:
//! ```bash
//! cargo run --example local_pipeline
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lexsmith::answer::ChatModel;
use lexsmith::config::EngineConfig;
use lexsmith::embeddings::{Embedder, HashEmbedder, InputKind};
use lexsmith::index::{IndexedRecord, MemoryVectorIndex, RecordMetadata, VectorIndex};
use lexsmith::search::NamespaceRegistry;
use lexsmith::{RagError, RetrievalService};

const PASSAGE_80C: &str = "Deductions under section 80C cover life insurance premiums and \
     provident fund contributions up to one and a half lakh rupees.";
const PASSAGE_44AD: &str = "Section 44AD lets eligible small businesses declare presumptive \
     income at eight percent of turnover.";
const PASSAGE_STT: &str = "Securities transaction tax is levied on every purchase and sale of \
     equity shares listed on a recognised stock exchange.";

const CONTRACT_NOTE: &str = "A contract is void if signed under duress. Courts generally uphold \
     damages claims. Specific performance remains an equitable remedy.";

/// Chat stand-in that answers from whatever context block the prompt
/// carries, so the demo output visibly reflects retrieval.
struct DemoChat;

#[async_trait]
impl ChatModel for DemoChat {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, RagError> {
        let context = user
            .split("Context:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\nQuestion:").next())
            .unwrap_or("")
            .trim();
        let gist: String = context.chars().take(120).collect();
        Ok(format!("Based strictly on the retrieved context: {gist}"))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Embed each passage in passage mode and upsert it into its shard.
async fn seed_corpus(
    embedder: &HashEmbedder,
    index: &MemoryVectorIndex,
) -> Result<(), RagError> {
    let passages = [
        ("ind_1", "doc-80c", PASSAGE_80C),
        ("ind_2", "doc-44ad", PASSAGE_44AD),
        ("ind_3", "doc-stt", PASSAGE_STT),
    ];
    for (namespace, id, text) in passages {
        let vector = embedder.embed_one(text, InputKind::Passage).await?;
        let record = IndexedRecord::new(id, vector, RecordMetadata::new(text));
        index.upsert(namespace, vec![record]).await?;
        info!("   ✓ indexed {id} into {namespace}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), RagError> {
    init_tracing();
    demo().await
}

async fn demo() -> Result<(), RagError> {
    info!("\n╔══════════════════════════════════════════════════════════╗");
    info!("║                     Local Pipeline                       ║");
    info!("║        Retrieval & Answering, Fully In-Process           ║");
    info!("╚══════════════════════════════════════════════════════════╝\n");

    // Step 1: Wiring
    info!("🔌 Step 1: Wiring the service against in-process stand-ins");

    let embedder = Arc::new(HashEmbedder::default());
    let index = Arc::new(MemoryVectorIndex::new());

    let service = RetrievalService::builder()
        .embedder(Arc::clone(&embedder) as Arc<dyn Embedder>)
        .index(Arc::clone(&index) as Arc<dyn VectorIndex>)
        .chat_model(Arc::new(DemoChat))
        .config(EngineConfig::default().with_registry(NamespaceRegistry::corpus(3)))
        .build();

    info!("   ✓ embedder: hash-based, {} dims", embedder.dims());
    info!("   ✓ index: in-memory, registry of 3 corpus namespaces");

    // Step 2: Seeding
    info!("\n📚 Step 2: Indexing one passage per corpus shard");
    seed_corpus(&embedder, &index).await?;

    // The hash embedder matches on exact wording only, so the lookup text
    // mirrors the indexed passage. A remote embedder makes this semantic.
    let query = PASSAGE_44AD;

    // Step 3: Cold retrieval
    info!("\n🔍 Step 3: Cold retrieval (cache is empty, all shards scanned)");
    let context = service.retrieve(query).await?;
    info!("   ✓ best context: {context}");
    info!(
        "   ✓ cache now holds {} record(s) after write-through",
        index.record_count("q_ind")
    );

    // Step 4: Cache hit
    info!("\n⚡ Step 4: Asking the same thing again (served from cache)");
    let cached = service.retrieve(query).await?;
    info!("   ✓ context matches the first run: {}", cached == context);
    info!(
        "   ✓ cache record count unchanged: {}",
        index.record_count("q_ind")
    );

    // Step 5: Grounded answer
    info!("\n💬 Step 5: Synthesizing a grounded answer");
    let outcome = service.answer(query).await?;
    info!("   ✓ answer: {}", outcome.answer);

    // Step 6: Upload-and-ask
    info!("\n📄 Step 6: Uploading a document and asking against it");
    let outcome = service
        .answer_with_document("What happens when a contract is signed under duress?", CONTRACT_NOTE)
        .await?;
    let sessions: Vec<String> = index
        .namespace_names()
        .into_iter()
        .filter(|name| name.starts_with("sess_"))
        .collect();
    info!("   ✓ session namespace(s): {sessions:?}");
    info!("   ✓ context came from the upload: {}", outcome.context);
    info!("   ✓ answer: {}", outcome.answer);

    info!("\n╔══════════════════════════════════════════════════════════╗");
    info!("║                  Local Pipeline Complete                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("\n✅ Patterns demonstrated:");
    info!("   • Collaborator injection through the service builder");
    info!("   • Fan-out scan with write-through query caching");
    info!("   • Context-grounded answer synthesis");
    info!("   • Session-scoped ingestion and lookup");

    Ok(())
}
