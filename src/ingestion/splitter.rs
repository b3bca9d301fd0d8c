//! Overlapping, boundary-seeking text segmentation.
//!
//! Splitting is deterministic and total: every valid document yields a chunk
//! sequence (possibly empty), and each chunk records its start offset so
//! chunk identity is stable across re-ingestion.

use tracing::debug;

use crate::types::{Chunk, Document};

/// Splits documents into chunks of at most `chunk_size` bytes with `overlap`
/// bytes shared between consecutive chunks of the same document.
///
/// Cut points prefer a paragraph break, then a line break, then a space
/// within the window before falling back to a hard cut; a boundary is only
/// taken in the second half of the window so progress is always made.
pub fn split_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let overlap = overlap.min(chunk_size.saturating_sub(1));
    let mut chunks = Vec::new();
    for document in documents {
        split_document(document, chunk_size.max(1), overlap, &mut chunks);
    }
    debug!(documents = documents.len(), chunks = chunks.len(), "split documents");
    chunks
}

fn split_document(document: &Document, chunk_size: usize, overlap: usize, out: &mut Vec<Chunk>) {
    let content = document.content.as_str();
    let total = content.len();
    let mut start = 0usize;

    while start < total {
        let end = if total - start <= chunk_size {
            total
        } else {
            let hard_end = prev_char_boundary(content, start + chunk_size);
            seek_boundary(content, start, hard_end)
        };

        out.push(Chunk::from_document(document, start, &content[start..end]));

        if end >= total {
            break;
        }
        let mut next = end.saturating_sub(overlap);
        if next <= start {
            next = end;
        }
        start = next_char_boundary(content, next);
    }
}

/// Picks the cut point for the window `start..hard_end`: the end of the last
/// paragraph break, line break or space in the window, provided it falls in
/// the window's second half; otherwise the hard cut stands.
fn seek_boundary(content: &str, start: usize, hard_end: usize) -> usize {
    let window = &content[start..hard_end];
    let min_span = window.len() / 2;
    for separator in ["\n\n", "\n", " "] {
        if let Some(position) = window.rfind(separator) {
            let cut = position + separator.len();
            if cut >= min_span && cut < window.len() {
                return start + cut;
            }
        }
    }
    hard_end
}

fn prev_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn document(content: String) -> Document {
        Document::new(content, Origin::Url, "doc")
    }

    #[test]
    fn five_thousand_chars_make_three_chunks_at_expected_offsets() {
        let doc = document("x".repeat(5000));
        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);

        assert_eq!(chunks.len(), 3);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset().unwrap()).collect();
        assert_eq!(offsets, vec![0, 1800, 3600]);
        assert_eq!(chunks[0].content.len(), 2000);
        assert_eq!(chunks[2].content.len(), 1400);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap_region() {
        let doc = document("y".repeat(4500));
        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);

        for pair in chunks.windows(2) {
            let tail = &pair[0].content[pair[0].content.len() - 200..];
            let head = &pair[1].content[..200];
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn prefers_paragraph_boundaries_over_hard_cuts() {
        let mut content = "a".repeat(1500);
        content.push_str("\n\n");
        content.push_str(&"b".repeat(1500));
        let doc = document(content);

        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);
        assert_eq!(chunks.len(), 2);
        // First chunk ends right after the paragraph break instead of at 2000.
        assert_eq!(chunks[0].content.len(), 1502);
        assert_eq!(chunks[1].start_offset().unwrap(), 1302);
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let doc = document("short text".to_string());
        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_offset(), Some(0));
        assert_eq!(chunks[0].content, "short text");
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let doc = document(String::new());
        assert!(split_documents(std::slice::from_ref(&doc), 2000, 200).is_empty());
    }

    #[test]
    fn offsets_stay_inside_the_parent_document() {
        let doc = document("z".repeat(7321));
        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);
        for chunk in &chunks {
            let start = chunk.start_offset().unwrap();
            assert!(start + chunk.content.len() <= doc.content.len());
        }
    }

    #[test]
    fn multibyte_content_never_splits_a_character() {
        let doc = document("é".repeat(3000));
        let chunks = split_documents(std::slice::from_ref(&doc), 2000, 200);
        assert!(chunks.len() >= 2);
        let rebuilt_len: usize = chunks.last().unwrap().start_offset().unwrap()
            + chunks.last().unwrap().content.len();
        assert_eq!(rebuilt_len, doc.content.len());
    }
}
