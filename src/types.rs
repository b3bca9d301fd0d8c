//! Core data model shared across the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a document originally came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Pdf,
    Url,
}

/// A normalized source document produced by the fetcher.
///
/// Immutable once created; the splitter is the only consumer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub origin: Origin,
    /// Stable identity of the source (URL or file name); chunk ids derive
    /// from it.
    pub source_id: String,
}

impl Document {
    pub fn new(
        content: impl Into<String>,
        origin: Origin,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
            origin,
            source_id: source_id.into(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Metadata key carrying the parent document's identity.
pub const META_SOURCE_ID: &str = "source_id";
/// Metadata key carrying the chunk's start offset within its parent.
pub const META_START_OFFSET: &str = "start_offset";

/// Deterministic chunk identity for a `(source_id, start_offset)` pair.
///
/// Stable across re-ingestion of identical content, and the dedup key used
/// when fusing lexical and semantic rankings.
pub fn chunk_id(source_id: &str, start_offset: usize) -> String {
    format!("{source_id}#{start_offset}")
}

/// An overlapping text segment derived from a [`Document`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Builds a chunk from a slice of its parent document, carrying the
    /// parent metadata plus provenance keys.
    pub fn from_document(document: &Document, start_offset: usize, content: &str) -> Self {
        let mut metadata = document.metadata.clone();
        metadata.insert(META_SOURCE_ID.to_string(), document.source_id.clone());
        metadata.insert(META_START_OFFSET.to_string(), start_offset.to_string());
        Self {
            id: chunk_id(&document.source_id, start_offset),
            content: content.to_string(),
            metadata,
        }
    }

    pub fn source_id(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE_ID).map(String::as_str)
    }

    pub fn start_offset(&self) -> Option<usize> {
        self.metadata.get(META_START_OFFSET)?.parse().ok()
    }
}

/// A chunk as exposed in query responses: content preview plus metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl SourceChunk {
    /// Truncates the chunk content to `preview_len` characters for transport.
    pub fn from_chunk(chunk: &Chunk, preview_len: usize) -> Self {
        let content = if chunk.content.chars().count() > preview_len {
            chunk.content.chars().take(preview_len).collect()
        } else {
            chunk.content.clone()
        };
        Self {
            content,
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Result of the query entry point: the answer text plus the chunks that
/// grounded it (empty for fallback and whole-corpus responses).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceChunk>,
}
