//! Crate-wide error taxonomy.
//!
//! Empty-index conditions are deliberately not represented here: a search
//! against a never-populated index is a normal state and yields an empty
//! result, never an error.

use thiserror::Error;

/// Failures surfaced by the ingestion and retrieval pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// Network fetch exhausted all retry attempts.
    #[error("fetch failed for {url} after {attempts} attempts: {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// A parseable file yielded no usable text. Recovered locally during
    /// ingestion (logged, treated as zero documents).
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The external embedding provider failed. Aborts the current request
    /// without mutating the index.
    #[error("embedding provider failure: {0}")]
    Embedding(String),

    /// The external language model failed.
    #[error("completion provider failure: {0}")]
    Completion(String),

    /// Input that cannot be turned into a document (bad URL, bad path).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
