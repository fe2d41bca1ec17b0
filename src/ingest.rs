//! Ingestion: read a source file, decode it, and build its pack.
//!
//! The decoder is chosen by file extension: `.pdf`, `.epub`, and anything
//! else as UTF-8 text.

use anyhow::{Context, Result};
use std::path::Path;

use crate::chunk::ChunkOptions;
use crate::extract::{decode_epub, decode_pdf, decode_text};
use crate::models::{DocumentPack, SourceDocument, SourceType, Structure};
use crate::pack::build_pack;

/// Decoder selected for `path`.
pub fn source_type_for(path: &Path) -> SourceType {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => SourceType::Pdf,
        Some("epub") => SourceType::Epub,
        _ => SourceType::Text,
    }
}

/// Decode `bytes` as `source_type` into a source descriptor and structure.
pub fn decode(
    source_type: SourceType,
    bytes: &[u8],
    filename: &str,
) -> Result<(SourceDocument, Structure)> {
    let decoded = match source_type {
        SourceType::Pdf => {
            let pdf = decode_pdf(bytes, filename)?;
            let source = SourceDocument {
                source_type,
                title: pdf.title,
                original_filename: filename.to_string(),
                content_hash: pdf.content_hash,
                author: None,
            };
            (source, Structure::Paged(pdf.pages))
        }
        SourceType::Epub => {
            let epub = decode_epub(bytes, filename)?;
            let source = SourceDocument {
                source_type,
                title: epub.title,
                original_filename: filename.to_string(),
                content_hash: epub.content_hash,
                author: epub.author,
            };
            (source, Structure::Sectioned(epub.sections))
        }
        SourceType::Text => {
            let text = decode_text(bytes, filename)?;
            let source = SourceDocument {
                source_type,
                title: text.title,
                original_filename: filename.to_string(),
                content_hash: text.content_hash,
                author: None,
            };
            (source, Structure::Sectioned(text.sections))
        }
    };
    Ok(decoded)
}

/// Read, decode, and build a pack for the file at `path`.
pub async fn ingest_file(path: &Path, opts: &ChunkOptions) -> Result<DocumentPack> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read source file: {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source_type = source_type_for(path);

    let (source, structure) = decode(source_type, &bytes, &filename)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    tracing::info!(
        file = %filename,
        source_type = source_type.as_str(),
        units = structure.pages().len() + structure.sections().len(),
        "decoded source"
    );

    Ok(build_pack(source, structure, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(source_type_for(&PathBuf::from("a/b.PDF")), SourceType::Pdf);
        assert_eq!(source_type_for(&PathBuf::from("book.epub")), SourceType::Epub);
        assert_eq!(source_type_for(&PathBuf::from("notes.md")), SourceType::Text);
        assert_eq!(source_type_for(&PathBuf::from("README")), SourceType::Text);
    }

    #[tokio::test]
    async fn test_ingest_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops_guide.txt");
        std::fs::write(&path, "# Restart\n1. Stop the api\n2. Start the api\n").unwrap();

        let pack = ingest_file(&path, &ChunkOptions::default()).await.unwrap();
        assert_eq!(pack.source.title, "ops guide");
        assert_eq!(pack.source.original_filename, "ops_guide.txt");
        assert_eq!(pack.structure.sections()[0].title, "Restart");
        assert_eq!(pack.artifacts.runbook.as_ref().unwrap().steps.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ingest_file(&dir.path().join("nope.txt"), &ChunkOptions::default())
            .await
            .is_err());
    }
}
