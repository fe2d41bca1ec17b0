//! Document Pack assembly and persistence.
//!
//! [`build_pack`] runs the whole derivation (chunking, every generator,
//! validation) over a decoded source. [`load_pack`] is the inverse of
//! [`save_pack`] and additionally checks the invariants serde cannot
//! express, reporting each violation with its field path.

use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chunk::{chunk_document, ChunkOptions};
use crate::generate::generate_all;
use crate::models::{
    Artifacts, Citation, DocumentPack, EvidenceGraph, Metadata, SourceDocument, Structure,
    Validation, PACK_VERSION,
};
use crate::validate::validate;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to read pack {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pack JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid pack:\n  {}", .violations.join("\n  "))]
    Schema { violations: Vec<String> },
}

/// Build a complete pack from a decoded source.
pub fn build_pack(source: SourceDocument, structure: Structure, opts: &ChunkOptions) -> DocumentPack {
    let chunks = chunk_document(&source, &structure, opts);
    tracing::info!(
        title = %source.title,
        chunks = chunks.len(),
        "chunked document"
    );

    let mut pack = DocumentPack {
        pack_version: PACK_VERSION.to_string(),
        created_at: Utc::now(),
        source,
        structure,
        chunks,
        artifacts: Artifacts::default(),
        evidence_graph: EvidenceGraph::default(),
        validation: Validation::default(),
        metadata: metadata(opts),
    };
    generate_all(&mut pack);
    pack.validation.claims = validate(&pack).claims;
    pack
}

fn metadata(opts: &ChunkOptions) -> Metadata {
    let mut versions = BTreeMap::new();
    versions.insert(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    let mut config = BTreeMap::new();
    config.insert("window_size".to_string(), opts.window_size().into());
    config.insert("overlap".to_string(), opts.overlap().into());
    Metadata {
        generator_versions: Some(versions),
        provider: None,
        config: Some(config),
    }
}

/// Write `pack` as pretty JSON, creating parent directories.
pub fn save_pack(pack: &DocumentPack, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(pack)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write pack: {}", path.display()))
}

pub fn load_pack(path: &Path) -> Result<DocumentPack, PackError> {
    let content = std::fs::read_to_string(path).map_err(|source| PackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pack(&content)
}

/// Deserialize and check a pack.
pub fn parse_pack(json: &str) -> Result<DocumentPack, PackError> {
    let pack: DocumentPack = serde_json::from_str(json)?;
    let violations = check_pack(&pack);
    if violations.is_empty() {
        Ok(pack)
    } else {
        Err(PackError::Schema { violations })
    }
}

/// Invariant violations of a deserialized pack, each prefixed by its field path.
pub fn check_pack(pack: &DocumentPack) -> Vec<String> {
    let mut out = Vec::new();

    if pack.pack_version != PACK_VERSION {
        out.push(format!(
            "pack_version: expected \"{}\", found \"{}\"",
            PACK_VERSION, pack.pack_version
        ));
    }

    match &pack.structure {
        Structure::Paged(pages) => {
            for (i, page) in pages.iter().enumerate() {
                if page.page_number == 0 {
                    out.push(format!("structure.pages[{}].page_number: must be >= 1", i));
                }
            }
        }
        Structure::Sectioned(sections) => {
            let mut seen = HashSet::new();
            for (i, section) in sections.iter().enumerate() {
                if !seen.insert(section.section_id.as_str()) {
                    out.push(format!(
                        "structure.sections[{}].section_id: duplicate id \"{}\"",
                        i, section.section_id
                    ));
                }
            }
        }
    }

    for (i, chunk) in pack.chunks.iter().enumerate() {
        check_citation(&mut out, &format!("chunks[{}].loc", i), &chunk.loc);
    }

    let a = &pack.artifacts;
    if let Some(outline) = &a.outline {
        for (i, node) in outline.nodes.iter().enumerate() {
            check_all(&mut out, &format!("artifacts.outline.nodes[{}]", i), &node.citations);
        }
    }
    if let Some(summaries) = &a.summaries {
        for (i, item) in summaries.items.iter().enumerate() {
            check_all(&mut out, &format!("artifacts.summaries.items[{}]", i), &item.citations);
        }
    }
    if let Some(runbook) = &a.runbook {
        for (i, step) in runbook.steps.iter().enumerate() {
            check_all(&mut out, &format!("artifacts.runbook.steps[{}]", i), &step.citations);
        }
    }
    if let Some(flow) = &a.flowcharts {
        for (i, node) in flow.nodes.iter().enumerate() {
            check_all(&mut out, &format!("artifacts.flowcharts.nodes[{}]", i), &node.citations);
        }
    }
    if let Some(tables) = &a.tables {
        for (t, table) in tables.tables.iter().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                let path = format!("artifacts.tables.tables[{}].rows[{}]", t, r);
                check_all(&mut out, &path, &row.citations);
            }
        }
    }
    if let Some(qa) = &a.qa {
        for (i, item) in qa.items.iter().enumerate() {
            check_all(&mut out, &format!("artifacts.qa.items[{}]", i), &item.citations);
        }
    }

    for (i, claim) in pack.validation.claims.iter().enumerate() {
        if let Some(citations) = &claim.citations {
            check_all(&mut out, &format!("validation.claims[{}]", i), citations);
        }
    }

    out
}

fn check_all(out: &mut Vec<String>, path: &str, citations: &[Citation]) {
    for (i, citation) in citations.iter().enumerate() {
        check_citation(out, &format!("{}.citations[{}]", path, i), citation);
    }
}

fn check_citation(out: &mut Vec<String>, path: &str, citation: &Citation) {
    out.extend(
        citation
            .violations()
            .into_iter()
            .map(|v| format!("{}: {}", path, v)),
    );
}
