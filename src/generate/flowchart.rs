//! Flowchart: a linear Mermaid graph.
//!
//! Built from the runbook when it has steps (`S1 --> S2 --> ...`, reusing
//! each step's citations), otherwise from the sections in order. Paged
//! documents without a runbook get a placeholder graph with no nodes.

use crate::citation::cite_section;
use crate::models::{DocumentPack, Flowchart, FlowchartNode};

const HEADER: &str = "graph TD";

fn node_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn node_line(id: &str, label: &str) -> String {
    format!("{}[\"{}\"]", id, label.replace('"', "'"))
}

fn chain(header: Vec<String>, nodes: &[FlowchartNode]) -> String {
    let mut lines = header;
    for pair in nodes.windows(2) {
        lines.push(format!("{} --> {}", pair[0].id, pair[1].id));
    }
    lines.join("\n")
}

pub fn generate_flowchart(pack: &DocumentPack) -> Flowchart {
    let steps = pack
        .artifacts
        .runbook
        .as_ref()
        .map(|r| r.steps.as_slice())
        .unwrap_or_default();

    if !steps.is_empty() {
        let nodes: Vec<FlowchartNode> = steps
            .iter()
            .enumerate()
            .map(|(i, step)| FlowchartNode {
                id: format!("S{}", i + 1),
                label: step.title.clone(),
                citations: step.citations.clone(),
            })
            .collect();
        let mut lines = vec![HEADER.to_string()];
        lines.extend(nodes.iter().map(|n| node_line(&n.id, &n.label)));
        let mermaid = chain(lines, &nodes);
        return Flowchart { mermaid, nodes };
    }

    let sections = pack.structure.sections();
    if !sections.is_empty() {
        let nodes: Vec<FlowchartNode> = sections
            .iter()
            .map(|section| FlowchartNode {
                id: node_id(&section.section_id),
                label: section.title.clone(),
                citations: cite_section(&pack.chunks, &section.section_id),
            })
            .collect();
        let mut lines = vec![HEADER.to_string()];
        lines.extend(nodes.iter().map(|n| node_line(&n.id, &n.label)));
        let mermaid = chain(lines, &nodes);
        return Flowchart { mermaid, nodes };
    }

    Flowchart {
        mermaid: format!("{}\nA[No data]", HEADER),
        nodes: Vec::new(),
    }
}
