//! ```text
//! PDF upload ──► ingestion::pdf ───┐
//!                                  ├─► ingestion::splitter ──► Chunks
//! URL scrape ──► ingestion::fetch ─┘            │
//!                                               │ embeddings::EmbeddingProvider
//!                                               ▼
//!                                    index::vector::VectorIndex
//!                                               │
//!                  ┌────────────────────────────┤
//!                  ▼                            ▼
//!       index::lexical::Bm25Index      semantic top-k search
//!         (rebuilt per hybrid query)            │
//!                  └────────► retrieval::fuse ◄─┘
//!                                    │
//! memory::MemoryWindow ──► llm prompt assembly ──► answer + sources
//! ```
//!
//! The [`service::RetrievalService`] ties the pipeline together: it owns the
//! vector index and the per-user conversation memory behind synchronized
//! accessors and exposes the ingestion and query entry points.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod llm;
pub mod memory;
pub mod persistence;
pub mod retrieval;
pub mod service;
pub mod types;

pub use config::Settings;
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider};
pub use error::RagError;
pub use llm::ChatModel;
pub use memory::MemoryWindow;
pub use retrieval::RetrievalMode;
pub use service::RetrievalService;
pub use types::{Answer, Chunk, Document, SourceChunk};
