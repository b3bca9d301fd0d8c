//! BM25 keyword index, rebuilt from the full chunk corpus per hybrid query.
//!
//! The index is a derived, stateless snapshot: it has no identity beyond the
//! chunk set it was built from, so lexical freshness is always exact at the
//! cost of an O(corpus) rebuild per hybrid query.

use std::collections::HashMap;

use crate::types::Chunk;

const K1: f32 = 1.5;
const B: f32 = 0.75;

struct IndexedChunk {
    chunk: Chunk,
    term_frequency: HashMap<String, f32>,
    length: f32,
}

/// Okapi BM25 ranking over a chunk snapshot.
pub struct Bm25Index {
    documents: Vec<IndexedChunk>,
    document_frequency: HashMap<String, f32>,
    average_length: f32,
}

impl Bm25Index {
    /// Builds the snapshot from the entire current chunk set.
    pub fn build<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> Self {
        let mut documents = Vec::new();
        let mut document_frequency: HashMap<String, f32> = HashMap::new();

        for chunk in chunks {
            let terms = tokenize(&chunk.content);
            let length = terms.len() as f32;
            let mut term_frequency: HashMap<String, f32> = HashMap::new();
            for term in terms {
                *term_frequency.entry(term).or_insert(0.0) += 1.0;
            }
            for term in term_frequency.keys() {
                *document_frequency.entry(term.clone()).or_insert(0.0) += 1.0;
            }
            documents.push(IndexedChunk {
                chunk: chunk.clone(),
                term_frequency,
                length,
            });
        }

        let average_length = if documents.is_empty() {
            0.0
        } else {
            documents.iter().map(|doc| doc.length).sum::<f32>() / documents.len() as f32
        };

        Self {
            documents,
            document_frequency,
            average_length,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Top-k chunks by BM25 score, ties broken by corpus insertion order.
    /// Chunks that match no query term are not returned.
    pub fn search(&self, query: &str, k: usize) -> Vec<(Chunk, f32)> {
        if self.documents.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let corpus_size = self.documents.len() as f32;
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let score = self.score(doc, &query_terms, corpus_size);
                (score > 0.0).then_some((score, doc))
            })
            .collect();
        // Stable sort preserves insertion order for tied scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(score, doc)| (doc.chunk.clone(), score))
            .collect()
    }

    fn score(&self, doc: &IndexedChunk, query_terms: &[String], corpus_size: f32) -> f32 {
        let mut score = 0.0;
        for term in query_terms {
            let Some(tf) = doc.term_frequency.get(term) else {
                continue;
            };
            let df = self.document_frequency.get(term).copied().unwrap_or(0.0);
            let idf = ((corpus_size - df + 0.5) / (df + 0.5) + 1.0).ln();
            let norm = K1 * (1.0 - B + B * doc.length / self.average_length.max(1.0));
            score += idf * (tf * (K1 + 1.0)) / (tf + norm);
        }
        score
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Origin};

    fn chunk(source: &str, content: &str) -> Chunk {
        let document = Document::new(content, Origin::Url, source);
        Chunk::from_document(&document, 0, content)
    }

    #[test]
    fn ranks_keyword_matches_above_unrelated_chunks() {
        let corpus = vec![
            chunk("a", "the quick brown fox jumps over the lazy dog"),
            chunk("b", "rust borrow checker and lifetimes explained"),
            chunk("c", "the fox den is home to a quick fox family"),
        ];
        let index = Bm25Index::build(&corpus);

        let results = index.search("quick fox", 2);
        assert_eq!(results.len(), 2);
        // "c" mentions fox twice and is shorter, so it outranks "a".
        assert_eq!(results[0].0.source_id(), Some("c"));
        assert_eq!(results[1].0.source_id(), Some("a"));
    }

    #[test]
    fn no_match_means_no_results() {
        let corpus = vec![chunk("a", "alpha beta"), chunk("b", "gamma delta")];
        let index = Bm25Index::build(&corpus);
        assert!(index.search("omega", 5).is_empty());
        assert!(index.search("", 5).is_empty());
    }

    #[test]
    fn tied_scores_keep_insertion_order() {
        let corpus = vec![
            chunk("first", "shared token here"),
            chunk("second", "shared token here"),
            chunk("third", "shared token here"),
        ];
        let index = Bm25Index::build(&corpus);

        let results = index.search("shared", 3);
        let order: Vec<_> = results
            .iter()
            .map(|(c, _)| c.source_id().unwrap().to_string())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_corpus_yields_empty_results() {
        let index = Bm25Index::build(std::iter::empty());
        assert!(index.is_empty());
        assert!(index.search("anything", 5).is_empty());
    }
}
