//! Text utilities shared by the decoders, the chunker, and the generators.
//!
//! All offsets handled here are counted in Unicode scalar values (`char`s),
//! which is the unit [`Citation`](crate::models::Citation) offsets use.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences.
///
/// The text is whitespace-normalized first; a boundary is the space that
/// follows `.`, `!` or `?`. Empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = normalize_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in cleaned.char_indices() {
        if c == ' ' && matches!(prev, Some('.' | '!' | '?')) {
            let piece = cleaned[start..i].trim();
            if !piece.is_empty() {
                sentences.push(piece.to_string());
            }
            start = i + 1;
        }
        prev = Some(c);
    }

    let tail = cleaned[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Trimmed, non-blank lines (`\n` or `\r\n` separated).
pub fn extract_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

/// Strip markup from an (X)HTML chapter and return whitespace-normalized text.
///
/// Script and style bodies are dropped entirely; the common named entities
/// and `&#39;` are decoded.
pub fn strip_html(html: &str) -> String {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();

    let text = cached(&SCRIPT, r"(?is)<script[^>]*>.*?</script>").replace_all(html, " ");
    let text = cached(&STYLE, r"(?is)<style[^>]*>.*?</style>").replace_all(&text, " ");
    let text = cached(&TAG, r"<[^>]+>").replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    normalize_whitespace(&text)
}

/// Human title from a file name: extension dropped, `_`/`-` runs become spaces.
pub fn title_from_filename(filename: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let base = match filename.rfind('.') {
        Some(dot) if !filename[dot + 1..].is_empty() && !filename[dot + 1..].contains('/') => {
            &filename[..dot]
        }
        _ => filename,
    };
    let cleaned = cached(&SEPARATORS, r"[_-]+").replace_all(base, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Substring over the char range `[start, end)`, clamped to the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    let from = byte_at(start);
    let to = byte_at(end.max(start));
    &text[from..to]
}

/// The first `max_chars` chars of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    char_slice(text, 0, max_chars)
}
