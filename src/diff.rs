//! Pack-to-pack comparison.
//!
//! Sections are compared by the SHA-256 of their text and chunks by ID.
//! Removed sections and chunks are not reported; results follow the order
//! of the newer pack.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{Citation, DocumentPack};
use crate::text::sha256_hex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub changed_sections: Vec<String>,
    pub changed_chunks: Vec<String>,
    pub impacted_artifacts: Vec<String>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changed_sections.is_empty() && self.changed_chunks.is_empty()
    }
}

pub fn diff(old: &DocumentPack, new: &DocumentPack) -> DiffResult {
    let old_sections: HashMap<&str, String> = old
        .structure
        .sections()
        .iter()
        .map(|s| (s.section_id.as_str(), sha256_hex(&s.text)))
        .collect();

    let changed_sections = new
        .structure
        .sections()
        .iter()
        .filter(|s| old_sections.get(s.section_id.as_str()) != Some(&sha256_hex(&s.text)))
        .map(|s| s.section_id.clone())
        .collect();

    let old_chunks: HashSet<&str> = old.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    let changed_chunks = new
        .chunks
        .iter()
        .filter(|c| !old_chunks.contains(c.chunk_id.as_str()))
        .map(|c| c.chunk_id.clone())
        .collect();

    DiffResult {
        changed_sections,
        changed_chunks,
        impacted_artifacts: impacted_artifacts(new),
    }
}

/// Families of `pack` with at least one cited item.
fn impacted_artifacts(pack: &DocumentPack) -> Vec<String> {
    fn any_cited<'a>(mut lists: impl Iterator<Item = &'a Vec<Citation>>) -> bool {
        lists.any(|c| !c.is_empty())
    }

    let a = &pack.artifacts;
    let mut out = Vec::new();
    if a.summaries
        .as_ref()
        .is_some_and(|s| any_cited(s.items.iter().map(|i| &i.citations)))
    {
        out.push("summaries".to_string());
    }
    if a.runbook
        .as_ref()
        .is_some_and(|r| any_cited(r.steps.iter().map(|s| &s.citations)))
    {
        out.push("runbook".to_string());
    }
    if a.flowcharts
        .as_ref()
        .is_some_and(|f| any_cited(f.nodes.iter().map(|n| &n.citations)))
    {
        out.push("flowcharts".to_string());
    }
    if a.tables.as_ref().is_some_and(|t| {
        any_cited(t.tables.iter().flat_map(|t| t.rows.iter().map(|r| &r.citations)))
    }) {
        out.push("tables".to_string());
    }
    out
}
