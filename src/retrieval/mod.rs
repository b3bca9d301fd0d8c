//! Retrieval modes and ensemble rank fusion.
//!
//! Semantic-only retrieval trades recall for latency; hybrid mode runs a
//! lexical and a semantic sub-search and fuses the rankings with fixed
//! weights, improving recall on exact-keyword queries that embeddings
//! under-rank.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::index::lexical::Bm25Index;
use crate::index::vector::VectorIndex;
use crate::types::Chunk;

/// Constant in the reciprocal-rank term; keeps single-list scores comparable
/// across lists of different lengths.
const RRF_CONSTANT: f32 = 60.0;

/// How the query orchestrator retrieves context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    #[default]
    Semantic,
    Hybrid,
}

/// Semantic-only retrieval: top-k nearest chunks to the query embedding.
pub fn semantic(index: &VectorIndex, query_embedding: &[f32], k: usize) -> Vec<Chunk> {
    index
        .search(query_embedding, k)
        .into_iter()
        .map(|(chunk, _)| chunk)
        .collect()
}

/// Hybrid retrieval: BM25 over a freshly built snapshot of the full corpus,
/// fused with the semantic ranking.
///
/// The lexical index is rebuilt here on every call; it is a stateless
/// snapshot of whatever the vector index currently holds.
pub fn hybrid(
    index: &VectorIndex,
    query: &str,
    query_embedding: &[f32],
    settings: &Settings,
) -> Vec<Chunk> {
    let lexical_index = Bm25Index::build(index.chunks());
    let lexical: Vec<Chunk> = lexical_index
        .search(query, settings.hybrid_lexical_k)
        .into_iter()
        .map(|(chunk, _)| chunk)
        .collect();
    let semantic = semantic(index, query_embedding, settings.hybrid_semantic_k);
    debug!(
        lexical = lexical.len(),
        semantic = semantic.len(),
        "fusing sub-search results"
    );
    fuse(
        &lexical,
        &semantic,
        settings.lexical_weight,
        settings.semantic_weight,
    )
}

/// Fuses two relevance-ranked lists with static weights.
///
/// Each chunk earns `weight / (rank + c)` from every list it appears in;
/// scores are summed per chunk id and the merged list is sorted descending.
/// A chunk present in only one list keeps its single weighted score — there
/// is no zero-fill for the missing list. Deterministic, and stable for ties
/// (first-seen order, lexical list first).
pub fn fuse(
    lexical: &[Chunk],
    semantic: &[Chunk],
    lexical_weight: f32,
    semantic_weight: f32,
) -> Vec<Chunk> {
    let mut order: Vec<&str> = Vec::new();
    let mut merged: HashMap<&str, (f32, &Chunk)> = HashMap::new();

    for (list, weight) in [(lexical, lexical_weight), (semantic, semantic_weight)] {
        for (rank, chunk) in list.iter().enumerate() {
            let contribution = weight / (rank as f32 + 1.0 + RRF_CONSTANT);
            match merged.get_mut(chunk.id.as_str()) {
                Some((score, _)) => *score += contribution,
                None => {
                    order.push(&chunk.id);
                    merged.insert(&chunk.id, (contribution, chunk));
                }
            }
        }
    }

    let mut ranked: Vec<(f32, &Chunk)> = order
        .iter()
        .map(|id| {
            let (score, chunk) = merged[id];
            (score, chunk)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, chunk)| chunk.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Origin};

    fn chunk(name: &str) -> Chunk {
        let document = Document::new(format!("content of {name}"), Origin::Url, name);
        Chunk::from_document(&document, 0, &document.content)
    }

    #[test]
    fn chunk_in_both_lists_ranks_first() {
        let a = chunk("a");
        let b = chunk("b");
        let c = chunk("c");

        let fused = fuse(
            &[a.clone(), b.clone()],
            &[b.clone(), c.clone()],
            0.4,
            0.6,
        );

        let ids: Vec<&str> = fused.iter().map(|chunk| chunk.id.as_str()).collect();
        assert_eq!(ids[0], b.id);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn fusion_is_deterministic() {
        let lexical = vec![chunk("a"), chunk("b")];
        let semantic = vec![chunk("b"), chunk("c")];

        let first = fuse(&lexical, &semantic, 0.4, 0.6);
        let second = fuse(&lexical, &semantic, 0.4, 0.6);
        assert_eq!(first, second);
    }

    #[test]
    fn single_list_chunk_keeps_its_weighted_score() {
        let a = chunk("a");
        let fused = fuse(&[a.clone()], &[], 0.4, 0.6);
        assert_eq!(fused, vec![a]);
    }

    #[test]
    fn empty_sub_results_fuse_to_empty() {
        assert!(fuse(&[], &[], 0.4, 0.6).is_empty());
    }

    #[test]
    fn duplicate_within_one_list_is_counted_once() {
        let a = chunk("a");
        let fused = fuse(&[a.clone(), a.clone()], &[], 0.4, 0.6);
        assert_eq!(fused.len(), 1);
    }
}
