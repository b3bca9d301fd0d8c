//! Ingestion: turning raw sources into chunked, index-ready documents.
//!
//! * [`fetch`] — URL retrieval with retry/backoff and HTML normalization.
//! * [`pdf`] — PDF upload storage and per-page text extraction.
//! * [`splitter`] — overlapping, boundary-seeking text segmentation.
//! * [`retry`] — bounded exponential backoff for transient network failures.

pub mod fetch;
pub mod pdf;
pub mod retry;
pub mod splitter;

pub use fetch::UrlFetcher;
pub use pdf::{PdfExtractor, PdftotextExtractor, load_pdf, store_upload};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use splitter::split_documents;
