//! Artifact generators.
//!
//! Each generator is a pure function of a [`DocumentPack`](crate::models::DocumentPack)
//! and is deterministic given its chunk sequence. Items are derived per
//! page or section (or per matched line, for the runbook) and cited by the
//! first chunk that covers the same unit. When no chunk matches, the item
//! is emitted with no citations and the validator reports it.
//!
//! | Generator | Output |
//! |-----------|--------|
//! | [`outline`] | One node per page or section |
//! | [`summaries`] | First sentence per page or section |
//! | [`runbook`] | Bullet lines (or sentences) as steps |
//! | [`flowchart`] | Mermaid graph of the runbook or the sections |
//! | [`tables`] | Section/page overview table, Markdown, CSV |
//! | [`qa`] | One seed question per page or section |

pub mod flowchart;
pub mod outline;
pub mod qa;
pub mod runbook;
pub mod summaries;
pub mod tables;

use crate::models::DocumentPack;

pub use flowchart::generate_flowchart;
pub use outline::generate_outline;
pub use qa::generate_qa_seeds;
pub use runbook::generate_runbook;
pub use summaries::generate_summaries;
pub use tables::generate_tables;

/// Run every generator and store the results in `pack.artifacts`.
///
/// The runbook is generated before the flowchart, which draws from it.
pub fn generate_all(pack: &mut DocumentPack) {
    pack.artifacts.outline = Some(generate_outline(pack));
    pack.artifacts.summaries = Some(generate_summaries(pack));
    pack.artifacts.runbook = Some(generate_runbook(pack));
    pack.artifacts.flowcharts = Some(generate_flowchart(pack));
    pack.artifacts.tables = Some(generate_tables(pack));
    pack.artifacts.qa = Some(generate_qa_seeds(pack));
}
