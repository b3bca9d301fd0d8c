//! The retrieval service: explicitly owned pipeline state plus the ingestion
//! and query orchestrators.
//!
//! One [`RetrievalService`] is constructed per process and shared by
//! reference across request handlers. The vector index and the per-user
//! memory windows live behind synchronized accessors; embedding and model
//! calls happen before any lock is taken, so no lock is ever held across an
//! await point.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;
use crate::embeddings::EmbeddingProvider;
use crate::error::RagError;
use crate::index::vector::{VectorEntry, VectorIndex};
use crate::ingestion::fetch::UrlFetcher;
use crate::ingestion::pdf::{self, PdfExtractor, PdftotextExtractor};
use crate::ingestion::splitter::split_documents;
use crate::llm::{self, ChatModel};
use crate::memory::MemoryWindow;
use crate::persistence::{ConversationStore, Role};
use crate::retrieval::{self, RetrievalMode};
use crate::types::{Answer, Chunk, Document, SourceChunk};

/// Fixed response for questions asked before anything was ingested.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents available. Upload a PDF or scrape a URL first.";
/// Fixed response when retrieval finds nothing relevant.
pub const NO_MATCH_MESSAGE: &str =
    "I couldn't find relevant information in the provided sources.";
pub const NO_DOCUMENTS_TO_SUMMARIZE: &str = "No documents available to summarize.";
pub const NO_DOCUMENTS_TO_TRANSLATE: &str = "No documents available to translate.";

const DEFAULT_TRANSLATION_LANGUAGE: &str = "French";

/// Owns the index and memory state and exposes the pipeline entry points.
pub struct RetrievalService {
    settings: Settings,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatModel>,
    pdf_extractor: Arc<dyn PdfExtractor>,
    fetcher: UrlFetcher,
    store: Option<Arc<dyn ConversationStore>>,
    index: RwLock<VectorIndex>,
    memories: Mutex<HashMap<String, MemoryWindow>>,
}

impl RetrievalService {
    pub fn builder() -> RetrievalServiceBuilder {
        RetrievalServiceBuilder::default()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of chunks currently indexed.
    pub fn indexed_chunks(&self) -> usize {
        self.index.read().len()
    }

    /// Stores an uploaded PDF under the configured directory, then ingests
    /// it. Returns the number of chunks added.
    pub async fn ingest_pdf_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<usize, RagError> {
        let path =
            pdf::store_upload(&self.settings.pdfs_directory, file_name, bytes).await?;
        self.ingest_pdf(&path).await
    }

    /// Ingests a PDF file from disk: extract pages, chunk, embed, index.
    /// Empty extraction is not an error; it reports zero chunks added.
    pub async fn ingest_pdf(&self, path: &Path) -> Result<usize, RagError> {
        let documents = pdf::load_pdf(self.pdf_extractor.as_ref(), path).await?;
        self.ingest_documents(documents).await
    }

    /// Scrapes a URL (with retry/backoff) and ingests the cleaned page.
    pub async fn ingest_url(&self, url: &str) -> Result<usize, RagError> {
        let url = Url::parse(url).map_err(|err| RagError::InvalidDocument(err.to_string()))?;
        let documents = self.fetcher.fetch_url(&url).await?;
        self.ingest_documents(documents).await
    }

    /// Chunks, embeds and indexes a document batch.
    ///
    /// Embedding failures abort before any index mutation; the batch is
    /// discarded and the error surfaces to the caller.
    pub async fn ingest_documents(&self, documents: Vec<Document>) -> Result<usize, RagError> {
        if documents.is_empty() {
            warn!("no documents to index");
            return Ok(0);
        }

        let chunks = split_documents(
            &documents,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        if chunks.is_empty() {
            warn!("documents produced no chunks");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<VectorEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorEntry { chunk, embedding })
            .collect();
        let added = entries.len();

        let mut index = self.index.write();
        index.add(entries);
        info!(added, total = index.len(), "indexed chunk batch");
        Ok(added)
    }

    /// Drops every indexed chunk, returning to the never-populated state.
    pub fn clear_index(&self) {
        self.index.write().clear();
        info!("vector index cleared");
    }

    /// Empties one user's conversation window.
    pub fn clear_memory(&self, user_id: &str) {
        if let Some(window) = self.memories.lock().get_mut(user_id) {
            window.clear();
        }
        info!(user_id, "conversation memory cleared");
    }

    /// Rendered memory transcript for a user, oldest exchange first.
    pub fn memory_transcript(&self, user_id: &str) -> String {
        self.memories
            .lock()
            .get(user_id)
            .map(MemoryWindow::render)
            .unwrap_or_default()
    }

    /// Answers a question for a user.
    ///
    /// `summarize` and `translate:<lang>` prefixes operate on the whole
    /// corpus; everything else retrieves per `mode`. Questions against a
    /// never-populated index and retrievals with no match short-circuit to
    /// fixed responses without invoking the language model.
    pub async fn answer(
        &self,
        question: &str,
        user_id: &str,
        mode: RetrievalMode,
    ) -> Result<Answer, RagError> {
        info!(user_id, ?mode, "received query");
        if let Some(store) = &self.store {
            store.save_message(user_id, Role::User, question).await?;
        }

        let trimmed = question.trim();
        let lowered = trimmed.to_lowercase();

        let (text, sources) = if lowered.starts_with("translate:") {
            let language = trimmed
                .split_once(':')
                .map(|(_, rest)| rest.trim())
                .filter(|rest| !rest.is_empty())
                .unwrap_or(DEFAULT_TRANSLATION_LANGUAGE)
                .to_string();
            (self.translate_corpus(&language).await?, Vec::new())
        } else if lowered.starts_with("summarize") {
            (self.summarize_corpus().await?, Vec::new())
        } else {
            self.answer_from_retrieval(trimmed, user_id, mode).await?
        };

        self.append_memory(user_id, question, &text);
        if let Some(store) = &self.store {
            store.save_message(user_id, Role::Assistant, &text).await?;
        }

        Ok(Answer { text, sources })
    }

    async fn answer_from_retrieval(
        &self,
        question: &str,
        user_id: &str,
        mode: RetrievalMode,
    ) -> Result<(String, Vec<SourceChunk>), RagError> {
        if self.index.read().is_empty() {
            warn!("index never populated, skipping retrieval");
            return Ok((NO_DOCUMENTS_MESSAGE.to_string(), Vec::new()));
        }

        let query_embedding = self.embedder.embed(question).await?;
        let retrieved: Vec<Chunk> = {
            let index = self.index.read();
            match mode {
                RetrievalMode::Semantic => retrieval::semantic(
                    &index,
                    &query_embedding,
                    self.settings.semantic_top_k,
                ),
                RetrievalMode::Hybrid => {
                    retrieval::hybrid(&index, question, &query_embedding, &self.settings)
                }
            }
        };
        info!(count = retrieved.len(), ?mode, "retrieved chunks");

        if retrieved.is_empty() {
            return Ok((NO_MATCH_MESSAGE.to_string(), Vec::new()));
        }

        let history = self.memory_transcript(user_id);
        let text =
            llm::answer_question(self.chat.as_ref(), question, &retrieved, &history).await?;
        let sources = retrieved
            .iter()
            .map(|chunk| SourceChunk::from_chunk(chunk, self.settings.source_preview_len))
            .collect();
        Ok((text, sources))
    }

    async fn summarize_corpus(&self) -> Result<String, RagError> {
        match self.corpus_text() {
            Some(text) => llm::summarize_text(self.chat.as_ref(), &text).await,
            None => Ok(NO_DOCUMENTS_TO_SUMMARIZE.to_string()),
        }
    }

    async fn translate_corpus(&self, language: &str) -> Result<String, RagError> {
        match self.corpus_text() {
            Some(text) => llm::translate_text(self.chat.as_ref(), &text, language).await,
            None => Ok(NO_DOCUMENTS_TO_TRANSLATE.to_string()),
        }
    }

    /// Full corpus content in insertion order, or `None` when nothing is
    /// indexed.
    fn corpus_text(&self) -> Option<String> {
        let index = self.index.read();
        if index.is_empty() {
            return None;
        }
        Some(llm::join_contents(
            index.chunks().map(|chunk| chunk.content.as_str()),
        ))
    }

    fn append_memory(&self, user_id: &str, question: &str, answer: &str) {
        let mut memories = self.memories.lock();
        let window = memories
            .entry(user_id.to_string())
            .or_insert_with(|| MemoryWindow::new(self.settings.memory_capacity));
        window.append(question, answer);
    }
}

/// Builder for [`RetrievalService`]; embedding provider and chat model are
/// required, everything else has defaults.
#[derive(Default)]
pub struct RetrievalServiceBuilder {
    settings: Option<Settings>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat: Option<Arc<dyn ChatModel>>,
    pdf_extractor: Option<Arc<dyn PdfExtractor>>,
    fetcher: Option<UrlFetcher>,
    store: Option<Arc<dyn ConversationStore>>,
}

impl RetrievalServiceBuilder {
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    #[must_use]
    pub fn pdf_extractor(mut self, extractor: Arc<dyn PdfExtractor>) -> Self {
        self.pdf_extractor = Some(extractor);
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: UrlFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn conversation_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<RetrievalService, RagError> {
        let settings = self.settings.unwrap_or_default();
        let embedder = self.embedder.ok_or_else(|| {
            RagError::InvalidDocument("an embedding provider is required".to_string())
        })?;
        let chat = self
            .chat
            .ok_or_else(|| RagError::InvalidDocument("a chat model is required".to_string()))?;
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => UrlFetcher::new(&settings)?,
        };

        Ok(RetrievalService {
            embedder,
            chat,
            pdf_extractor: self
                .pdf_extractor
                .unwrap_or_else(|| Arc::new(PdftotextExtractor)),
            fetcher,
            store: self.store,
            index: RwLock::new(VectorIndex::new()),
            memories: Mutex::new(HashMap::new()),
            settings,
        })
    }
}
