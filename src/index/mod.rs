//! In-memory indexes over the chunk corpus.
//!
//! * [`vector`] — embedding store with cosine top-k search; grows via `add`,
//!   resets via `clear`, no partial deletes.
//! * [`lexical`] — BM25 snapshot rebuilt from the full chunk set on demand.

pub mod lexical;
pub mod vector;

pub use lexical::Bm25Index;
pub use vector::{VectorEntry, VectorIndex};
