//! In-memory vector index with cosine-similarity search.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Chunk;

/// A chunk paired with its embedding. Owned exclusively by the index;
/// created on `add`, never mutated, removed only by `clear`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Append-only embedding store for the process lifetime.
///
/// An empty index means "never populated" (or cleared): searches return an
/// empty list, which callers treat as a normal state rather than an error.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a batch of entries. Repeated calls keep appending; the index
    /// is created lazily on first use so no prior state is required.
    pub fn add(&mut self, entries: Vec<VectorEntry>) {
        self.entries.extend(entries);
        debug!(total = self.entries.len(), "vector index grew");
    }

    /// Drops every entry, returning the index to its never-populated state.
    /// Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Chunks in insertion order; the lexical snapshot and whole-corpus
    /// operations read from here.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }

    /// Top-k entries by cosine similarity to `query`, most similar first.
    /// Ties keep insertion order. Empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(Chunk, f32)> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &VectorEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();
        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| (entry.chunk.clone(), score))
            .collect()
    }
}

/// Cosine similarity; zero when either vector has zero norm or the lengths
/// disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Origin};

    fn entry(id: &str, embedding: Vec<f32>) -> VectorEntry {
        let document = Document::new(id, Origin::Url, id);
        VectorEntry {
            chunk: Chunk::from_document(&document, 0, id),
            embedding,
        }
    }

    #[test]
    fn search_on_never_populated_index_is_empty() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn search_ranks_by_cosine_similarity() {
        let mut index = VectorIndex::new();
        index.add(vec![
            entry("far", vec![0.0, 1.0]),
            entry("near", vec![1.0, 0.1]),
            entry("exact", vec![1.0, 0.0]),
        ]);

        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "exact");
        assert_eq!(results[1].0.content, "near");
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn clear_returns_to_never_populated_state() {
        let mut index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0])]);
        assert_eq!(index.len(), 1);

        index.clear();
        index.clear();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 1).is_empty());
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
