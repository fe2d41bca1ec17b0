//! Citation resolution.
//!
//! A [`Citation`] caches an `excerpt`, but the cache can go stale once a
//! pack is edited or transformed. [`resolve_excerpt`] re-reads the text the
//! citation points at and is the only trustworthy answer; [`normalize`]
//! refreshes the cache for display.

use crate::models::{Chunk, Citation, CitationKind, DocumentPack, Structure};
use crate::text::char_slice;

/// Text at `[char_start, char_end)` of the referenced page or section.
///
/// Returns `""` when the page or section does not exist, or when the
/// citation kind does not fit the structure (a page citation into a
/// sectioned document). Offsets past the end are clamped.
pub fn resolve_excerpt(structure: &Structure, citation: &Citation) -> String {
    let text = match citation.kind {
        CitationKind::PdfPage => citation
            .page
            .and_then(|n| structure.page(n))
            .map(|p| p.text.as_str()),
        CitationKind::EpubLocation | CitationKind::TextLocation => citation
            .section_id
            .as_deref()
            .and_then(|id| structure.section(id))
            .map(|s| s.text.as_str()),
    };
    text.map(|t| char_slice(t, citation.char_start, citation.char_end).to_string())
        .unwrap_or_default()
}

/// Copy of `citation` with its excerpt re-derived from the structure.
///
/// Keeps the existing excerpt when resolution yields nothing, so the
/// citation stays displayable.
pub fn normalize(structure: &Structure, citation: &Citation) -> Citation {
    let excerpt = resolve_excerpt(structure, citation);
    Citation {
        excerpt: if excerpt.is_empty() {
            citation.excerpt.clone()
        } else {
            excerpt
        },
        ..citation.clone()
    }
}

/// Refresh every cached excerpt in `pack` (chunks, artifacts, and claims).
///
/// The viewer serves packs through this, so the evidence it shows is
/// always the text at the cited offsets.
pub fn normalize_pack(pack: &mut DocumentPack) {
    let DocumentPack {
        structure,
        chunks,
        artifacts,
        validation,
        ..
    } = pack;
    let structure: &Structure = structure;
    let refresh = |list: &mut Vec<Citation>| {
        for c in list.iter_mut() {
            *c = normalize(structure, c);
        }
    };

    for chunk in chunks.iter_mut() {
        chunk.loc = normalize(structure, &chunk.loc);
    }
    if let Some(outline) = &mut artifacts.outline {
        outline.nodes.iter_mut().for_each(|n| refresh(&mut n.citations));
    }
    if let Some(summaries) = &mut artifacts.summaries {
        summaries.items.iter_mut().for_each(|i| refresh(&mut i.citations));
    }
    if let Some(runbook) = &mut artifacts.runbook {
        runbook.steps.iter_mut().for_each(|s| refresh(&mut s.citations));
    }
    if let Some(flow) = &mut artifacts.flowcharts {
        flow.nodes.iter_mut().for_each(|n| refresh(&mut n.citations));
    }
    if let Some(tables) = &mut artifacts.tables {
        for table in &mut tables.tables {
            table.rows.iter_mut().for_each(|r| refresh(&mut r.citations));
        }
    }
    if let Some(qa) = &mut artifacts.qa {
        qa.items.iter_mut().for_each(|i| refresh(&mut i.citations));
    }
    for claim in &mut validation.claims {
        if let Some(citations) = &mut claim.citations {
            refresh(citations);
        }
    }
}

/// Citation for the span a chunk covers.
pub fn citation_from_chunk(chunk: &Chunk) -> Citation {
    chunk.loc.clone()
}

/// Citation list for the first chunk on `page_number`, or empty.
pub fn cite_page(chunks: &[Chunk], page_number: u32) -> Vec<Citation> {
    chunks
        .iter()
        .find(|c| c.loc.is_on_page(page_number))
        .map(citation_from_chunk)
        .into_iter()
        .collect()
}

/// Citation list for the first chunk in `section_id`, or empty.
pub fn cite_section(chunks: &[Chunk], section_id: &str) -> Vec<Citation> {
    chunks
        .iter()
        .find(|c| c.loc.is_in_section(section_id))
        .map(citation_from_chunk)
        .into_iter()
        .collect()
}
