//! Size-bounded chunking that prefers natural text boundaries.

use super::{Chunker, ChunkingConfig};
use crate::vector_store::{Passage, PassageMetadata};

/// Break points, most preferred first.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Greedy chunker with boundary snapping and fixed overlap.
///
/// Each chunk takes up to `chunk_size` characters. When the window stops
/// short of the end of the text, the break is pulled back to the last
/// paragraph, line, sentence or word boundary in the window. The next
/// chunk starts `chunk_overlap` characters before the previous one ended.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split text into overlapping pieces. Pieces are exact substrings.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // offsets[i] is the byte offset of char i; the last entry is text.len()
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let n = offsets.len() - 1;

        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);

        if n <= size {
            return vec![text];
        }

        let mut pieces = Vec::new();
        let mut start = 0;

        loop {
            let window_end = (start + size).min(n);
            let end = if window_end == n {
                n
            } else {
                let min_end = start + (size / 2).max(overlap + 1);
                snap_to_boundary(text, &offsets, min_end, window_end).unwrap_or(window_end)
            };

            pieces.push(&text[offsets[start]..offsets[end]]);

            if end == n {
                break;
            }

            let next = end - overlap;
            start = if next > start { next } else { end };
        }

        pieces
    }
}

/// Find the char index just past the best separator ending in `(min_end, window_end]`.
fn snap_to_boundary(text: &str, offsets: &[usize], min_end: usize, window_end: usize) -> Option<usize> {
    if min_end >= window_end {
        return None;
    }

    let lo = offsets[min_end];
    let hi = offsets[window_end];

    for sep in SEPARATORS {
        // A separator may start before `lo` and still end inside the range.
        let mut search_from = lo.saturating_sub(sep.len() - 1);
        while !text.is_char_boundary(search_from) {
            search_from -= 1;
        }
        let haystack = &text[search_from..hi];
        if let Some(pos) = haystack.rfind(sep) {
            let boundary = search_from + pos + sep.len();
            if boundary > lo {
                return offsets.binary_search(&boundary).ok();
            }
        }
    }

    None
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str, source: &str, page: Option<u32>) -> Vec<Passage> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Passage::new(piece.to_string(), PassageMetadata::new(source, page, i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    /// Stitch pieces back together by dropping each overlap prefix.
    fn reassemble(pieces: &[&str], overlap: usize) -> String {
        let mut out = String::new();
        for (i, piece) in pieces.iter().enumerate() {
            if i == 0 {
                out.push_str(piece);
            } else {
                out.extend(piece.chars().skip(overlap));
            }
        }
        out
    }

    fn long_text() -> String {
        let sentences = [
            "Ginger is a warming herb that supports digestion.",
            "Take it with warm water after meals.",
            "Turmeric reduces inflammation when combined with black pepper.",
            "People on blood thinners should consult a physician first.",
            "Tulsi leaves can be chewed daily for respiratory health.",
        ];
        let mut text = String::new();
        for round in 0..12 {
            for s in &sentences {
                text.push_str(s);
                text.push(' ');
            }
            if round % 3 == 2 {
                text.push_str("\n\n");
            }
        }
        text
    }

    #[test]
    fn test_short_document_is_one_passage() {
        let text = "Ginger reduces nausea. Take 1g twice daily.";
        let passages = RecursiveChunker::default().chunk(text, "ginger.pdf", Some(1));

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].content, text);
        assert_eq!(passages[0].metadata.source, "ginger.pdf");
        assert_eq!(passages[0].metadata.page, Some(1));
    }

    #[test]
    fn test_document_exactly_chunk_size_is_one_passage() {
        let text = "a".repeat(500);
        assert_eq!(RecursiveChunker::default().split(&text).len(), 1);
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let c = RecursiveChunker::default();
        assert!(c.chunk("", "a.pdf", None).is_empty());
        assert!(c.chunk("  \n\t ", "a.pdf", None).is_empty());
    }

    #[test]
    fn test_adjacent_pieces_share_exact_overlap() {
        let text = long_text();
        let pieces = chunker(500, 50).split(&text);
        assert!(pieces.len() > 2);

        for pair in pieces.windows(2) {
            let tail: String = pair[0].chars().skip(char_len(pair[0]) - 50).collect();
            let head: String = pair[1].chars().take(50).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_pieces_cover_the_document() {
        let text = long_text();
        let pieces = chunker(500, 50).split(&text);
        assert_eq!(reassemble(&pieces, 50), text);
    }

    #[test]
    fn test_pieces_respect_size() {
        let text = long_text();
        for piece in chunker(200, 20).split(&text) {
            assert!(char_len(piece) <= 200);
        }
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let text = long_text();
        let pieces = chunker(200, 20).split(&text);

        for piece in &pieces[..pieces.len() - 1] {
            assert!(
                piece.ends_with(". ") || piece.ends_with('\n'),
                "piece did not end on a boundary: {:?}",
                piece
            );
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "x".repeat(150);
        let second = "y ".repeat(100);
        let text = format!("{}\n\n{}", first, second);

        let pieces = chunker(200, 10).split(&text);
        assert_eq!(pieces[0], format!("{}\n\n", first));
    }

    #[test]
    fn test_unbroken_text_is_hard_split() {
        let text = "z".repeat(1200);
        let pieces = chunker(500, 50).split(&text);

        assert_eq!(pieces.len(), 3);
        assert_eq!(char_len(pieces[0]), 500);
        assert_eq!(reassemble(&pieces, 50), text);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "अश्वगंधा तनाव कम करता है। ".repeat(40);
        let pieces = chunker(100, 10).split(&text);

        assert!(pieces.len() > 1);
        assert_eq!(reassemble(&pieces, 10), text);
    }

    #[test]
    fn test_chunk_indices_are_sequential() {
        let text = long_text();
        let passages = chunker(300, 30).chunk(&text, "herbs.txt", None);
        for (i, p) in passages.iter().enumerate() {
            assert_eq!(p.metadata.chunk_index, i);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }
}
