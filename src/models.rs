//! Core data models used throughout doc-canvas.
//!
//! These types make up the Document Pack: the source descriptor, its
//! structure (pages or sections), the citation-anchored chunks, the
//! generated artifacts, and the validation claims. Every type here
//! serializes to the persisted pack JSON through `serde`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Format tag written to (and required from) every pack.
pub const PACK_VERSION: &str = "0.1.0";

// ============ Source ============

/// Kind of document a pack was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Pdf,
    Epub,
    Text,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pdf => "pdf",
            SourceType::Epub => "epub",
            SourceType::Text => "text",
        }
    }

    /// Citation kind used for chunks of this source type.
    pub fn citation_kind(&self) -> CitationKind {
        match self {
            SourceType::Pdf => CitationKind::PdfPage,
            SourceType::Epub => CitationKind::EpubLocation,
            SourceType::Text => CitationKind::TextLocation,
        }
    }
}

/// Immutable descriptor of the ingested source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub title: String,
    pub original_filename: String,
    /// SHA-256 hex of the raw source; root of every derived identifier.
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

// ============ Structure ============

/// One page of a PDF source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

/// One section of an EPUB or plain-text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub title: String,
    pub order: u32,
    pub text: String,
}

/// Normalized document structure: pages or sections, never both.
///
/// Serializes as `{"pages": [...]}` or `{"sections": [...]}`. A JSON object
/// carrying both keys (or neither) does not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Structure {
    #[serde(rename = "pages")]
    Paged(Vec<Page>),
    #[serde(rename = "sections")]
    Sectioned(Vec<Section>),
}

impl Structure {
    /// Pages of a paged structure; empty for sectioned ones.
    pub fn pages(&self) -> &[Page] {
        match self {
            Structure::Paged(pages) => pages,
            Structure::Sectioned(_) => &[],
        }
    }

    /// Sections of a sectioned structure; empty for paged ones.
    pub fn sections(&self) -> &[Section] {
        match self {
            Structure::Paged(_) => &[],
            Structure::Sectioned(sections) => sections,
        }
    }

    pub fn page(&self, page_number: u32) -> Option<&Page> {
        self.pages().iter().find(|p| p.page_number == page_number)
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections().iter().find(|s| s.section_id == section_id)
    }
}

// ============ Citation ============

/// How a [`Citation`] addresses the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    PdfPage,
    EpubLocation,
    TextLocation,
}

impl CitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationKind::PdfPage => "pdf_page",
            CitationKind::EpubLocation => "epub_location",
            CitationKind::TextLocation => "text_location",
        }
    }
}

/// A location anchor into the source text.
///
/// `page` is set only for [`CitationKind::PdfPage`]; `section_id` only for
/// the two section kinds. `char_start..char_end` counts chars within the
/// referenced page or section. `excerpt` is a cached copy that may be stale;
/// [`crate::citation::resolve_excerpt`] is the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_content_hash: String,
    pub kind: CitationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    pub char_start: usize,
    pub char_end: usize,
    pub excerpt: String,
    pub confidence: f64,
}

impl Citation {
    /// Anchor into a PDF page.
    pub fn for_page(
        doc_content_hash: &str,
        page: u32,
        char_start: usize,
        char_end: usize,
        excerpt: String,
    ) -> Self {
        Self {
            doc_content_hash: doc_content_hash.to_string(),
            kind: CitationKind::PdfPage,
            page: Some(page),
            section_id: None,
            char_start,
            char_end,
            excerpt,
            confidence: 1.0,
        }
    }

    /// Anchor into an EPUB or text section. `kind` must be a section kind.
    pub fn for_section(
        doc_content_hash: &str,
        kind: CitationKind,
        section_id: &str,
        char_start: usize,
        char_end: usize,
        excerpt: String,
    ) -> Self {
        debug_assert!(kind != CitationKind::PdfPage);
        Self {
            doc_content_hash: doc_content_hash.to_string(),
            kind,
            page: None,
            section_id: Some(section_id.to_string()),
            char_start,
            char_end,
            excerpt,
            confidence: 1.0,
        }
    }

    /// Whether this citation points into the given PDF page.
    pub fn is_on_page(&self, page_number: u32) -> bool {
        self.kind == CitationKind::PdfPage && self.page == Some(page_number)
    }

    /// Whether this citation points into the given section.
    pub fn is_in_section(&self, section_id: &str) -> bool {
        self.section_id.as_deref() == Some(section_id)
    }

    /// Descriptions of every broken invariant, empty when the citation is well-formed.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.char_start > self.char_end {
            out.push(format!(
                "char_start ({}) exceeds char_end ({})",
                self.char_start, self.char_end
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            out.push(format!("confidence {} outside [0, 1]", self.confidence));
        }
        match self.kind {
            CitationKind::PdfPage => {
                match self.page {
                    None => out.push("page is required for pdf_page".to_string()),
                    Some(0) => out.push("page must be >= 1".to_string()),
                    Some(_) => {}
                }
                if self.section_id.is_some() {
                    out.push("section_id is not allowed for pdf_page".to_string());
                }
            }
            CitationKind::EpubLocation | CitationKind::TextLocation => {
                if self.section_id.is_none() {
                    out.push(format!("section_id is required for {}", self.kind.as_str()));
                }
                if self.page.is_some() {
                    out.push(format!("page is not allowed for {}", self.kind.as_str()));
                }
            }
        }
        out
    }
}

/// A citation-anchored window of source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub loc: Citation,
}

// ============ Artifacts ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: String,
    pub title: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub nodes: Vec<OutlineNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub id: String,
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summaries {
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunbookStep {
    pub id: String,
    pub title: String,
    pub instructions: Vec<String>,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runbook {
    pub steps: Vec<RunbookStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartNode {
    pub id: String,
    pub label: String,
    pub citations: Vec<Citation>,
}

/// Mermaid source plus the nodes it draws.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flowchart {
    pub mermaid: String,
    pub nodes: Vec<FlowchartNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub title: String,
    pub rows: Vec<TableRow>,
}

/// Generated tables; the first one is also rendered as Markdown and CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaItem {
    pub id: String,
    pub question: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaSeeds {
    pub items: Vec<QaItem>,
}

/// Answer to a free-text question, cited by the chunks it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub used_chunks: Vec<String>,
}

/// All artifact families of a pack. A family is `None` until generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summaries: Option<Summaries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook: Option<Runbook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowcharts: Option<Flowchart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Tables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa: Option<QaSeeds>,
}

/// One generated item viewed as a claim: its family, claim id, and citations.
#[derive(Debug, Clone)]
pub struct ClaimRef<'a> {
    pub family: &'static str,
    pub id: String,
    pub citations: &'a [Citation],
}

impl<'a> ClaimRef<'a> {
    fn new(family: &'static str, id: String, citations: &'a [Citation]) -> Self {
        Self {
            family,
            id,
            citations,
        }
    }
}

impl Artifacts {
    /// Every item of every populated family, in family order.
    ///
    /// Ids are unique across families. Outline and flowchart ids reuse
    /// section ids, so their claims are named `outline_<id>` and
    /// `flow_<id>`; table rows have no id of their own and are named
    /// `<table_id>_row_<i>`.
    pub fn claim_refs(&self) -> Vec<ClaimRef<'_>> {
        let mut refs = Vec::new();
        if let Some(outline) = &self.outline {
            for node in &outline.nodes {
                let id = format!("outline_{}", node.id);
                refs.push(ClaimRef::new("outline", id, &node.citations));
            }
        }
        if let Some(summaries) = &self.summaries {
            for item in &summaries.items {
                refs.push(ClaimRef::new("summaries", item.id.clone(), &item.citations));
            }
        }
        if let Some(runbook) = &self.runbook {
            for step in &runbook.steps {
                refs.push(ClaimRef::new("runbook", step.id.clone(), &step.citations));
            }
        }
        if let Some(flow) = &self.flowcharts {
            for node in &flow.nodes {
                let id = format!("flow_{}", node.id);
                refs.push(ClaimRef::new("flowcharts", id, &node.citations));
            }
        }
        if let Some(tables) = &self.tables {
            for table in &tables.tables {
                for (i, row) in table.rows.iter().enumerate() {
                    let id = format!("{}_row_{}", table.id, i);
                    refs.push(ClaimRef::new("tables", id, &row.citations));
                }
            }
        }
        if let Some(qa) = &self.qa {
            for item in &qa.items {
                refs.push(ClaimRef::new("qa", item.id.clone(), &item.citations));
            }
        }
        refs
    }
}

// ============ Evidence graph ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceNode {
    pub id: String,
    pub label: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: String,
}

/// Reserved for claim/evidence links; always written empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGraph {
    pub nodes: Vec<EvidenceNode>,
    pub edges: Vec<EvidenceEdge>,
}

// ============ Validation ============

/// Outcome of checking one claim.
///
/// Only [`Verdict::MissingCitations`] is produced today; the others are
/// part of the pack format and accepted on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Supported,
    Unsupported,
    Unclear,
    MissingCitations,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Supported => "supported",
            Verdict::Unsupported => "unsupported",
            Verdict::Unclear => "unclear",
            Verdict::MissingCitations => "missing_citations",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supported" => Ok(Verdict::Supported),
            "unsupported" => Ok(Verdict::Unsupported),
            "unclear" => Ok(Verdict::Unclear),
            "missing_citations" => Ok(Verdict::MissingCitations),
            other => Err(format!(
                "unknown verdict '{}': expected supported, unsupported, unclear, or missing_citations",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub verdict: Verdict,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub claims: Vec<Claim>,
}

// ============ Pack ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_versions: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
}

/// The serialized unit: source, structure, chunks, artifacts, and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPack {
    pub pack_version: String,
    pub created_at: DateTime<Utc>,
    pub source: SourceDocument,
    pub structure: Structure,
    pub chunks: Vec<Chunk>,
    pub artifacts: Artifacts,
    pub evidence_graph: EvidenceGraph,
    pub validation: Validation,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_serializes_as_single_key() {
        let s = Structure::Paged(vec![Page {
            page_number: 1,
            text: "x".into(),
        }]);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("pages").is_some());
        assert!(json.get("sections").is_none());
    }

    #[test]
    fn structure_with_both_keys_is_rejected() {
        let json = r#"{"pages": [], "sections": []}"#;
        assert!(serde_json::from_str::<Structure>(json).is_err());
    }

    #[test]
    fn structure_with_no_keys_is_rejected() {
        assert!(serde_json::from_str::<Structure>("{}").is_err());
    }

    #[test]
    fn page_citation_is_well_formed() {
        let c = Citation::for_page("abc", 3, 0, 10, "excerpt".into());
        assert!(c.violations().is_empty());
        assert!(c.is_on_page(3));
        assert!(!c.is_in_section("s1"));
    }

    #[test]
    fn section_citation_without_id_is_flagged() {
        let mut c = Citation::for_section("abc", CitationKind::EpubLocation, "s1", 4, 2, "".into());
        c.section_id = None;
        c.page = Some(2);
        let v = c.violations();
        assert_eq!(v.len(), 3, "{:?}", v);
    }

    #[test]
    fn verdict_round_trips_through_strings() {
        assert_eq!(
            "missing_citations".parse::<Verdict>().unwrap(),
            Verdict::MissingCitations
        );
        assert!("bogus".parse::<Verdict>().is_err());
        assert_eq!(Verdict::Unclear.to_string(), "unclear");
    }

    #[test]
    fn claim_refs_name_table_rows() {
        let artifacts = Artifacts {
            tables: Some(Tables {
                tables: vec![Table {
                    id: "t".into(),
                    title: "T".into(),
                    rows: vec![
                        TableRow {
                            cells: vec!["a".into()],
                            citations: vec![],
                        },
                        TableRow {
                            cells: vec!["b".into()],
                            citations: vec![],
                        },
                    ],
                }],
                markdown: None,
                csv: None,
            }),
            ..Default::default()
        };
        let ids: Vec<String> = artifacts.claim_refs().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["t_row_0", "t_row_1"]);
    }
}
