//! Q&A seeds: one question per section or page.

use crate::citation::{cite_page, cite_section};
use crate::models::{DocumentPack, QaItem, QaSeeds, Structure};

pub fn generate_qa_seeds(pack: &DocumentPack) -> QaSeeds {
    let items = match &pack.structure {
        Structure::Sectioned(sections) => sections
            .iter()
            .map(|section| QaItem {
                id: format!("qa_{}", section.section_id),
                question: format!("What does \"{}\" cover?", section.title),
                citations: cite_section(&pack.chunks, &section.section_id),
            })
            .collect(),
        Structure::Paged(pages) => pages
            .iter()
            .map(|page| QaItem {
                id: format!("qa_page_{}", page.page_number),
                question: format!("What is discussed on page {}?", page.page_number),
                citations: cite_page(&pack.chunks, page.page_number),
            })
            .collect(),
    };
    QaSeeds { items }
}
