//! Sliding-window text chunker.
//!
//! Splits every page (PDF) or section (EPUB/text) independently into
//! overlapping windows of `window_size` chars, advancing by
//! `window_size - overlap`. Each window becomes a [`Chunk`] whose location
//! is a [`Citation`] into that page or section.
//!
//! # Identifiers
//!
//! A chunk's ID is the SHA-256 of its full location plus its text:
//!
//! ```text
//! sha256("{content_hash}:{kind}:{page}:{section_id}:{char_start}:{char_end}:{text}")
//! ```
//!
//! Rebuilding an unchanged document therefore yields the same IDs, and an
//! edit only changes the IDs of windows that overlap the edited range.
//!
//! # Example
//!
//! ```rust
//! use doc_canvas::chunk::{chunk_document, ChunkOptions};
//! use doc_canvas::models::{Section, SourceDocument, SourceType, Structure};
//!
//! let source = SourceDocument {
//!     source_type: SourceType::Text,
//!     title: "Test".into(),
//!     original_filename: "test.txt".into(),
//!     content_hash: "abc".into(),
//!     author: None,
//! };
//! let structure = Structure::Sectioned(vec![Section {
//!     section_id: "section_1".into(),
//!     title: "Section 1".into(),
//!     order: 0,
//!     text: "Hello world. This is a test.".into(),
//! }]);
//! let opts = ChunkOptions::new(10, 2).unwrap();
//! let chunks = chunk_document(&source, &structure, &opts);
//! assert!(chunks.len() > 1);
//! ```

use anyhow::{bail, Result};

use crate::models::{Chunk, Citation, CitationKind, SourceDocument, Structure};
use crate::text::{sha256_hex, truncate_chars};

/// Number of chars cached in each chunk's `excerpt`.
pub const EXCERPT_CHARS: usize = 200;

/// Window geometry. Construction guarantees `window_size > overlap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    window_size: usize,
    overlap: usize,
}

impl ChunkOptions {
    pub fn new(window_size: usize, overlap: usize) -> Result<Self> {
        if window_size == 0 {
            bail!("chunking.window_size must be > 0");
        }
        if overlap >= window_size {
            bail!(
                "chunking.overlap ({}) must be smaller than chunking.window_size ({})",
                overlap,
                window_size
            );
        }
        Ok(Self {
            window_size,
            overlap,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            window_size: 1000,
            overlap: 200,
        }
    }
}

/// Chunk a whole document, pages or sections in order.
///
/// The output is ordered by unit, then by position within the unit. The
/// generators rely on that order when they pick the first chunk covering
/// a page or section.
pub fn chunk_document(
    source: &SourceDocument,
    structure: &Structure,
    opts: &ChunkOptions,
) -> Vec<Chunk> {
    let hash = source.content_hash.as_str();
    let mut chunks = Vec::new();

    match structure {
        Structure::Paged(pages) => {
            for page in pages {
                for_each_window(&page.text, opts, |start, end, text| {
                    let loc = Citation::for_page(hash, page.page_number, start, end, excerpt(text));
                    chunks.push(make_chunk(loc, text));
                });
            }
        }
        Structure::Sectioned(sections) => {
            let kind = match source.source_type.citation_kind() {
                CitationKind::PdfPage => CitationKind::TextLocation,
                kind => kind,
            };
            for section in sections {
                for_each_window(&section.text, opts, |start, end, text| {
                    let loc =
                        Citation::for_section(hash, kind, &section.section_id, start, end, excerpt(text));
                    chunks.push(make_chunk(loc, text));
                });
            }
        }
    }

    chunks
}

/// Char ranges `[start, end)` of the windows over a text of `len` chars.
pub fn window_ranges(len: usize, opts: &ChunkOptions) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + opts.window_size).min(len);
        ranges.push((start, end));
        if end >= len {
            break;
        }
        // end = start + window_size here, so the next start still advances.
        start = end - opts.overlap;
    }
    ranges
}

fn for_each_window(text: &str, opts: &ChunkOptions, mut f: impl FnMut(usize, usize, &str)) {
    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;

    for (start, end) in window_ranges(len, opts) {
        f(start, end, &text[bounds[start]..bounds[end]]);
    }
}

fn excerpt(window: &str) -> String {
    truncate_chars(window, EXCERPT_CHARS).to_string()
}

/// Deterministic chunk ID over the location and the window text.
pub fn chunk_id(loc: &Citation, text: &str) -> String {
    let page = loc.page.map(|p| p.to_string()).unwrap_or_default();
    let section = loc.section_id.as_deref().unwrap_or("");
    sha256_hex(format!(
        "{}:{}:{}:{}:{}:{}:{}",
        loc.doc_content_hash,
        loc.kind.as_str(),
        page,
        section,
        loc.char_start,
        loc.char_end,
        text
    ))
}

fn make_chunk(loc: Citation, text: &str) -> Chunk {
    Chunk {
        chunk_id: chunk_id(&loc, text),
        text: text.to_string(),
        loc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, Section, SourceType};

    fn source(source_type: SourceType) -> SourceDocument {
        SourceDocument {
            source_type,
            title: "Test".into(),
            original_filename: "test".into(),
            content_hash: "abc".into(),
            author: None,
        }
    }

    fn sections(texts: &[&str]) -> Structure {
        Structure::Sectioned(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Section {
                    section_id: format!("section_{}", i + 1),
                    title: format!("Section {}", i + 1),
                    order: i as u32,
                    text: t.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_hello_world_splits_into_text_locations() {
        let opts = ChunkOptions::new(10, 2).unwrap();
        let chunks = chunk_document(
            &source(SourceType::Text),
            &sections(&["Hello world. This is a test."]),
            &opts,
        );
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].loc.kind, CitationKind::TextLocation);
        assert_eq!(chunks[0].text, "Hello worl");
        assert_eq!(chunks[0].loc.section_id.as_deref(), Some("section_1"));
    }

    #[test]
    fn test_windows_cover_text_with_exact_overlap() {
        let opts = ChunkOptions::new(10, 3).unwrap();
        for len in [0usize, 1, 9, 10, 11, 17, 18, 100, 101] {
            let ranges = window_ranges(len, &opts);
            if len == 0 {
                assert!(ranges.is_empty());
                continue;
            }
            assert_eq!(ranges[0].0, 0);
            assert_eq!(ranges.last().unwrap().1, len);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].1 - pair[1].0, 3, "len {}: {:?}", len, ranges);
                assert_eq!(pair[0].1 - pair[0].0, 10);
            }
        }
    }

    #[test]
    fn test_empty_unit_produces_no_chunks() {
        let opts = ChunkOptions::new(10, 2).unwrap();
        let chunks = chunk_document(&source(SourceType::Epub), &sections(&["", "abc"]), &opts);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].loc.section_id.as_deref(), Some("section_2"));
        assert_eq!(chunks[0].loc.kind, CitationKind::EpubLocation);
    }

    #[test]
    fn test_short_text_is_one_window() {
        let opts = ChunkOptions::new(50, 49).unwrap();
        let chunks = chunk_document(&source(SourceType::Text), &sections(&["tiny"]), &opts);
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].loc.char_start, chunks[0].loc.char_end), (0, 4));
    }

    #[test]
    fn test_pages_use_pdf_locations() {
        let structure = Structure::Paged(vec![
            Page {
                page_number: 1,
                text: "first page text".into(),
            },
            Page {
                page_number: 2,
                text: "second".into(),
            },
        ]);
        let chunks = chunk_document(&source(SourceType::Pdf), &structure, &ChunkOptions::default());
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].loc.is_on_page(1));
        assert!(chunks[1].loc.is_on_page(2));
        assert!(chunks.iter().all(|c| c.loc.violations().is_empty()));
    }

    #[test]
    fn test_deterministic_ids() {
        let opts = ChunkOptions::new(8, 2).unwrap();
        let structure = sections(&["Alpha beta gamma delta", "epsilon zeta"]);
        let a = chunk_document(&source(SourceType::Text), &structure, &opts);
        let b = chunk_document(&source(SourceType::Text), &structure, &opts);
        let ids_a: Vec<_> = a.iter().map(|c| c.chunk_id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|c| c.chunk_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_single_char_edit_changes_only_overlapping_chunks() {
        let opts = ChunkOptions::new(10, 2).unwrap();
        let original = "abcdefghijklmnopqrstuvwxyz0123";
        // Windows: [0,10) [8,18) [16,26) [24,30). Index 12 is only in the second.
        let mut edited: Vec<char> = original.chars().collect();
        edited[12] = 'X';
        let edited: String = edited.into_iter().collect();

        let a = chunk_document(&source(SourceType::Text), &sections(&[original]), &opts);
        let b = chunk_document(&source(SourceType::Text), &sections(&[&edited]), &opts);
        assert_eq!(a.len(), b.len());
        let changed: Vec<usize> = a
            .iter()
            .zip(b.iter())
            .enumerate()
            .filter(|(_, (x, y))| x.chunk_id != y.chunk_id)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![1]);
    }

    #[test]
    fn test_excerpt_is_first_200_chars() {
        let text = "x".repeat(500);
        let chunks = chunk_document(
            &source(SourceType::Text),
            &sections(&[&text]),
            &ChunkOptions::new(300, 0).unwrap(),
        );
        assert_eq!(chunks[0].loc.excerpt.len(), EXCERPT_CHARS);
        assert_eq!(chunks[0].text.len(), 300);
        assert_eq!(chunks[0].loc.confidence, 1.0);
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let opts = ChunkOptions::new(3, 1).unwrap();
        let chunks = chunk_document(&source(SourceType::Text), &sections(&["┌──┐│ok"]), &opts);
        assert_eq!(chunks[0].text, "┌──");
        assert_eq!((chunks[1].loc.char_start, chunks[1].loc.char_end), (2, 5));
        assert_eq!(chunks[1].text, "─┐│");
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(ChunkOptions::new(0, 0).is_err());
        assert!(ChunkOptions::new(5, 5).is_err());
        assert!(ChunkOptions::new(5, 7).is_err());
        assert!(ChunkOptions::new(5, 4).is_ok());
    }
}
