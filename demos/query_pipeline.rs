//! Runs the full pipeline offline: ingest a couple of documents, then ask
//! questions in semantic and hybrid mode and watch the memory window fill.
//!
//! Uses the deterministic mock embedder and a canned chat model, so no API
//! key or network access is needed:
//!
//! ```bash
//! cargo run --example query_pipeline
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use docchat::embeddings::MockEmbeddingProvider;
use docchat::error::RagError;
use docchat::llm::ChatModel;
use docchat::retrieval::RetrievalMode;
use docchat::service::RetrievalService;
use docchat::types::{Document, Origin};
use docchat::Settings;

/// Stand-in chat model: echoes the first context line so the retrieval
/// result is visible in the printed answer.
struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let context_line = prompt
            .lines()
            .skip_while(|line| *line != "Context:")
            .nth(1)
            .unwrap_or("(no context)");
        Ok(format!("Based on the sources: {context_line}"))
    }
}

#[tokio::main]
async fn main() -> Result<(), RagError> {
    init_tracing();

    let service = RetrievalService::builder()
        .settings(Settings::default())
        .embedder(Arc::new(MockEmbeddingProvider::new()))
        .chat_model(Arc::new(EchoModel))
        .build()?;

    let documents = vec![
        Document::new(
            "Rust's ownership model guarantees memory safety without a \
             garbage collector. The borrow checker enforces aliasing rules \
             at compile time."
                .to_string(),
            Origin::Url,
            "https://example.com/rust-ownership",
        ),
        Document::new(
            "BM25 ranks documents by term frequency, inverse document \
             frequency and document length normalization."
                .to_string(),
            Origin::Url,
            "https://example.com/bm25",
        ),
    ];
    let added = service.ingest_documents(documents).await?;
    println!("indexed {added} chunks\n");

    for (question, mode) in [
        ("How does Rust guarantee memory safety?", RetrievalMode::Semantic),
        ("term frequency ranking", RetrievalMode::Hybrid),
        ("summarize", RetrievalMode::Semantic),
    ] {
        let answer = service.answer(question, "demo-user", mode).await?;
        println!("Q ({mode:?}): {question}");
        println!("A: {}", answer.text);
        for source in &answer.sources {
            let origin = source
                .metadata
                .get("source_id")
                .map(String::as_str)
                .unwrap_or("unknown");
            println!("   source {origin} | {}", source.content);
        }
        println!();
    }

    println!("memory window:\n{}", service.memory_transcript("demo-user"));
    Ok(())
}

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    });
}
