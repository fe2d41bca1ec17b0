//! Plain-text renderings of artifacts for the `canvas` subcommands.

use crate::diff::DiffResult;
use crate::models::{Answer, Outline, Runbook, Summaries, Tables};

pub fn render_outline(outline: &Outline) -> String {
    if outline.nodes.is_empty() {
        return "No outline nodes.".to_string();
    }
    bullets(outline.nodes.iter().map(|n| n.title.as_str()))
}

pub fn render_summaries(summaries: &Summaries) -> String {
    if summaries.items.is_empty() {
        return "No summaries.".to_string();
    }
    bullets(summaries.items.iter().map(|i| i.text.as_str()))
}

/// Numbered steps, each followed by its indented instructions.
pub fn render_runbook(runbook: &Runbook) -> String {
    if runbook.steps.is_empty() {
        return "No runbook steps.".to_string();
    }
    runbook
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}\n   {}", i + 1, step.title, step.instructions.join(" ")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The Markdown rendering when present, otherwise a bullet list per table.
pub fn render_tables(tables: &Tables) -> String {
    if let Some(markdown) = &tables.markdown {
        return markdown.clone();
    }
    if tables.tables.is_empty() {
        return "No tables.".to_string();
    }
    tables
        .tables
        .iter()
        .map(|table| {
            let rows = table.rows.iter().map(|r| r.cells.join(" | ")).collect::<Vec<_>>();
            format!("{}\n{}", table.title, bullets(rows.iter().map(String::as_str)))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_answer(answer: &Answer) -> String {
    format!("{}\n\nCitations: {}", answer.answer, answer.citations.len())
}

pub fn render_diff(diff: &DiffResult) -> String {
    let impacted = if diff.impacted_artifacts.is_empty() {
        "none".to_string()
    } else {
        diff.impacted_artifacts.join(", ")
    };
    format!(
        "Changed sections: {}\nChanged chunks: {}\nImpacted artifacts: {}",
        diff.changed_sections.len(),
        diff.changed_chunks.len(),
        impacted
    )
}

fn bullets<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines.map(|l| format!("- {}", l)).collect::<Vec<_>>().join("\n")
}
