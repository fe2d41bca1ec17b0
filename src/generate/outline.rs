//! Outline: one node per page or section.

use crate::citation::{cite_page, cite_section};
use crate::models::{DocumentPack, Outline, OutlineNode, Structure};

pub fn generate_outline(pack: &DocumentPack) -> Outline {
    let nodes = match &pack.structure {
        Structure::Paged(pages) => pages
            .iter()
            .map(|page| OutlineNode {
                id: format!("page_{}", page.page_number),
                title: format!("Page {}", page.page_number),
                citations: cite_page(&pack.chunks, page.page_number),
            })
            .collect(),
        Structure::Sectioned(sections) => sections
            .iter()
            .map(|section| OutlineNode {
                id: section.section_id.clone(),
                title: if section.title.trim().is_empty() {
                    "Section".to_string()
                } else {
                    section.title.clone()
                },
                citations: cite_section(&pack.chunks, &section.section_id),
            })
            .collect(),
    };
    Outline { nodes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::fixtures;

    #[test]
    fn pages_become_page_nodes() {
        let pack = fixtures::paged(&["one", "two"]);
        let outline = generate_outline(&pack);
        let titles: Vec<_> = outline.nodes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Page 1", "Page 2"]);
        assert_eq!(outline.nodes[1].id, "page_2");
        assert!(outline.nodes[1].citations[0].is_on_page(2));
    }

    #[test]
    fn sections_keep_titles_and_cite_first_chunk() {
        let pack = fixtures::sectioned(&[("a", "Alpha", "text a"), ("b", "  ", "text b")]);
        let outline = generate_outline(&pack);
        assert_eq!(outline.nodes[0].title, "Alpha");
        assert_eq!(outline.nodes[1].title, "Section");
        assert_eq!(outline.nodes[1].citations.len(), 1);
        assert_eq!(outline.nodes[1].citations[0].char_start, 0);
    }

    #[test]
    fn empty_section_has_no_citation() {
        let pack = fixtures::sectioned(&[("a", "Alpha", "")]);
        let outline = generate_outline(&pack);
        assert_eq!(outline.nodes.len(), 1);
        assert!(outline.nodes[0].citations.is_empty());
    }
}
