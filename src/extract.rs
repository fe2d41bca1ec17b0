//! Source decoding: PDF pages, EPUB chapters, and plain-text sections.
//!
//! Decoders take raw bytes (or text) and return the normalized structure
//! of the document plus its content hash. They never panic on malformed
//! input; every failure is a [`DecodeError`] and no pack is built.
//!
//! EPUB containers are read directly: `META-INF/container.xml` names the
//! OPF package, whose spine gives chapter order and whose NCX table of
//! contents gives chapter titles.

use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use thiserror::Error;

use crate::models::{Page, Section};
use crate::text::{extract_lines, normalize_whitespace, sha256_hex, strip_html, title_from_filename};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("EPUB extraction failed: {0}")]
    Epub(String),
    #[error("text decoding failed: {0}")]
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfDecoded {
    pub title: String,
    pub content_hash: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpubDecoded {
    pub title: String,
    pub author: Option<String>,
    pub content_hash: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDecoded {
    pub title: String,
    pub content_hash: String,
    pub sections: Vec<Section>,
}

// ============ PDF ============

/// One whitespace-normalized page per PDF page, numbered from 1.
pub fn decode_pdf(bytes: &[u8], filename: &str) -> Result<PdfDecoded, DecodeError> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| DecodeError::Pdf(e.to_string()))?;
    let pages = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Page {
            page_number: i as u32 + 1,
            text: normalize_whitespace(text),
        })
        .collect::<Vec<_>>();
    tracing::debug!(pages = pages.len(), "decoded pdf");

    Ok(PdfDecoded {
        title: title_from_filename(filename),
        content_hash: sha256_hex(bytes),
        pages,
    })
}

// ============ Plain text ============

fn heading() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^[A-Z][A-Z\s\d]{4,}$").expect("static regex"))
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#') || heading().is_match(line)
}

/// Split text into sections at heading lines.
///
/// A heading is a `#`-prefixed line or an all-caps line of five or more
/// chars. Body lines are whitespace-normalized and kept one per line.
/// Text with no body lines under any heading becomes a single `section_1`.
pub fn segment_text(content: &str, title: &str) -> TextDecoded {
    let mut sections: Vec<Section> = Vec::new();
    let mut current_title = "Section 1".to_string();
    let mut current: Vec<String> = Vec::new();

    let flush = |title: &str, lines: &mut Vec<String>, sections: &mut Vec<Section>| {
        if lines.is_empty() {
            return;
        }
        let order = sections.len() as u32;
        sections.push(Section {
            section_id: format!("section_{}", order + 1),
            title: title.to_string(),
            order,
            text: lines.join("\n"),
        });
        lines.clear();
    };

    for line in extract_lines(content) {
        if is_heading(line) {
            flush(&current_title, &mut current, &mut sections);
            current_title = line.trim_start_matches('#').trim().to_string();
            continue;
        }
        current.push(normalize_whitespace(line));
    }
    flush(&current_title, &mut current, &mut sections);

    if sections.is_empty() {
        sections.push(Section {
            section_id: "section_1".to_string(),
            title: "Section 1".to_string(),
            order: 0,
            text: normalize_whitespace(content),
        });
    }

    TextDecoded {
        title: title.to_string(),
        content_hash: sha256_hex(content),
        sections,
    }
}

/// Decode UTF-8 bytes and segment them; the title comes from the file name.
pub fn decode_text(bytes: &[u8], filename: &str) -> Result<TextDecoded, DecodeError> {
    let content = std::str::from_utf8(bytes).map_err(|e| DecodeError::Text(e.to_string()))?;
    Ok(segment_text(content, &title_from_filename(filename)))
}

// ============ EPUB ============

type Archive<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

fn epub_err(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Epub(e.to_string())
}

fn read_entry(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>, DecodeError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| DecodeError::Epub(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(MAX_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(epub_err)?;
    if out.len() as u64 >= MAX_ENTRY_BYTES {
        return Err(DecodeError::Epub(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_ENTRY_BYTES
        )));
    }
    Ok(out)
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == name {
            a.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

/// Resolve `href` against the directory of `base` (both archive paths).
fn join_path(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = match base.rfind('/') {
        Some(i) => base[..i].split('/').collect(),
        None => Vec::new(),
    };
    for piece in href.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn rootfile_path(container: &[u8]) -> Result<String, DecodeError> {
    let mut reader = quick_xml::Reader::from_reader(container);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(epub_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path") {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Err(DecodeError::Epub(
        "container.xml names no rootfile".to_string(),
    ))
}

#[derive(Debug, Default)]
struct Package {
    title: Option<String>,
    author: Option<String>,
    /// manifest id -> href
    manifest: HashMap<String, String>,
    spine: Vec<String>,
    toc_id: Option<String>,
}

fn parse_opf(xml: &[u8]) -> Result<Package, DecodeError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut package = Package::default();
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(epub_err)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"title" if package.title.is_none() => field = Some("title"),
                b"creator" if package.author.is_none() => field = Some("creator"),
                b"item" => {
                    if let (Some(id), Some(href)) = (attr(&e, b"id"), attr(&e, b"href")) {
                        package.manifest.insert(id, href);
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attr(&e, b"idref") {
                        package.spine.push(idref);
                    }
                }
                b"spine" => package.toc_id = attr(&e, b"toc"),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(name) = field.take() {
                    let value = normalize_whitespace(&t.unescape().map_err(epub_err)?);
                    if !value.is_empty() {
                        match name {
                            "title" => package.title = Some(value),
                            _ => package.author = Some(value),
                        }
                    }
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(package)
}

/// NCX navPoint titles keyed by the archive path they point to.
fn parse_ncx(xml: &[u8], ncx_path: &str) -> Result<HashMap<String, String>, DecodeError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut titles = HashMap::new();
    let mut in_label = false;
    let mut pending: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(epub_err)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"navLabel" => in_label = true,
                b"content" => {
                    if let (Some(label), Some(src)) = (pending.take(), attr(&e, b"src")) {
                        titles.entry(join_path(ncx_path, &src)).or_insert(label);
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_label => {
                let label = normalize_whitespace(&t.unescape().map_err(epub_err)?);
                if !label.is_empty() {
                    pending = Some(label);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"navLabel" => in_label = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(titles)
}

/// One section per spine item, in reading order.
///
/// Section ids are manifest ids; titles come from the NCX, falling back
/// to `Section N`. Metadata title falls back to the file name.
pub fn decode_epub(bytes: &[u8], filename: &str) -> Result<EpubDecoded, DecodeError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(epub_err)?;

    let container = read_entry(&mut archive, "META-INF/container.xml")?;
    let opf_path = rootfile_path(&container)?;
    let package = parse_opf(&read_entry(&mut archive, &opf_path)?)?;

    let toc = match package
        .toc_id
        .as_ref()
        .and_then(|id| package.manifest.get(id))
    {
        Some(href) => {
            let ncx_path = join_path(&opf_path, href);
            match read_entry(&mut archive, &ncx_path) {
                Ok(xml) => parse_ncx(&xml, &ncx_path)?,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable table of contents, using default titles");
                    HashMap::new()
                }
            }
        }
        None => HashMap::new(),
    };

    let mut sections = Vec::with_capacity(package.spine.len());
    for (i, idref) in package.spine.iter().enumerate() {
        let href = package
            .manifest
            .get(idref)
            .ok_or_else(|| DecodeError::Epub(format!("spine item '{}' not in manifest", idref)))?;
        let path = join_path(&opf_path, href);
        let raw = read_entry(&mut archive, &path)?;
        let html = String::from_utf8_lossy(&raw);
        sections.push(Section {
            section_id: if idref.is_empty() {
                format!("section_{}", i + 1)
            } else {
                idref.clone()
            },
            title: toc
                .get(&path)
                .cloned()
                .unwrap_or_else(|| format!("Section {}", i + 1)),
            order: i as u32,
            text: strip_html(&html),
        });
    }
    tracing::debug!(sections = sections.len(), "decoded epub");

    Ok(EpubDecoded {
        title: package
            .title
            .unwrap_or_else(|| title_from_filename(filename)),
        author: package.author,
        content_hash: sha256_hex(bytes),
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = decode_pdf(b"not a pdf", "x.pdf").unwrap_err();
        assert!(matches!(err, DecodeError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_epub_error() {
        let err = decode_epub(b"not a zip", "x.epub").unwrap_err();
        assert!(matches!(err, DecodeError::Epub(_)));
    }

    #[test]
    fn invalid_utf8_returns_text_error() {
        let err = decode_text(&[0xff, 0xfe, 0x00], "x.txt").unwrap_err();
        assert!(matches!(err, DecodeError::Text(_)));
    }

    #[test]
    fn text_splits_at_headings() {
        let content = "# Install\nRun   the installer.\n\nOVERVIEW OF OPS\n- step one\n- step two\n";
        let decoded = segment_text(content, "Guide");
        let titles: Vec<_> = decoded.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Install", "OVERVIEW OF OPS"]);
        assert_eq!(decoded.sections[0].text, "Run the installer.");
        assert_eq!(decoded.sections[1].text, "- step one\n- step two");
        assert_eq!(decoded.sections[1].section_id, "section_2");
        assert_eq!(decoded.sections[1].order, 1);
        assert_eq!(decoded.content_hash, sha256_hex(content));
    }

    #[test]
    fn text_before_first_heading_is_section_one() {
        let decoded = segment_text("Preamble.\n# Next\nBody.", "T");
        assert_eq!(decoded.sections[0].title, "Section 1");
        assert_eq!(decoded.sections[1].title, "Next");
    }

    #[test]
    fn text_without_headings_is_single_section() {
        let decoded = segment_text("Hello world. This is a test.", "T");
        assert_eq!(decoded.sections.len(), 1);
        assert_eq!(decoded.sections[0].section_id, "section_1");
        assert_eq!(decoded.sections[0].text, "Hello world. This is a test.");
    }

    #[test]
    fn headings_only_fall_back_to_whole_text() {
        let decoded = segment_text("# Title\nCHAPTER ONE", "T");
        assert_eq!(decoded.sections.len(), 1);
        assert_eq!(decoded.sections[0].text, "# Title CHAPTER ONE");
    }

    #[test]
    fn short_caps_lines_are_body() {
        let decoded = segment_text("NOTE\nbody", "T");
        assert_eq!(decoded.sections[0].text, "NOTE\nbody");
    }

    #[test]
    fn paths_resolve_relative_to_package() {
        assert_eq!(join_path("OEBPS/content.opf", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(join_path("OEBPS/toc.ncx", "../ch1.xhtml#a"), "ch1.xhtml");
        assert_eq!(join_path("content.opf", "ch1.xhtml"), "ch1.xhtml");
    }
}
