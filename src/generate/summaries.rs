//! Summaries: the first sentence of each page or section.

use crate::citation::{cite_page, cite_section};
use crate::models::{DocumentPack, Structure, Summaries, SummaryItem};
use crate::text::split_sentences;

pub fn generate_summaries(pack: &DocumentPack) -> Summaries {
    let mut items = Vec::new();

    match &pack.structure {
        Structure::Paged(pages) => {
            for page in pages {
                // Pages without any sentence are skipped.
                let Some(first) = split_sentences(&page.text).into_iter().next() else {
                    continue;
                };
                items.push(SummaryItem {
                    id: format!("summary_page_{}", page.page_number),
                    text: first,
                    citations: cite_page(&pack.chunks, page.page_number),
                });
            }
        }
        Structure::Sectioned(sections) => {
            for section in sections {
                let Some(first) = split_sentences(&section.text).into_iter().next() else {
                    continue;
                };
                items.push(SummaryItem {
                    id: format!("summary_{}", section.section_id),
                    text: first,
                    citations: cite_section(&pack.chunks, &section.section_id),
                });
            }
        }
    }

    Summaries { items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::fixtures;

    #[test]
    fn first_sentence_per_section() {
        let pack = fixtures::sectioned(&[
            ("s1", "One", "Hello world. This is a test."),
            ("s2", "Two", "   "),
            ("s3", "Three", "No terminal punctuation here"),
        ]);
        let summaries = generate_summaries(&pack);
        assert_eq!(summaries.items.len(), 2);
        assert_eq!(summaries.items[0].id, "summary_s1");
        assert_eq!(summaries.items[0].text, "Hello world.");
        assert_eq!(summaries.items[1].text, "No terminal punctuation here");
        assert!(summaries.items.iter().all(|i| i.citations.len() == 1));
    }

    #[test]
    fn first_sentence_per_page() {
        let pack = fixtures::paged(&["Intro! More text.", "Second page?"]);
        let summaries = generate_summaries(&pack);
        assert_eq!(summaries.items[0].id, "summary_page_1");
        assert_eq!(summaries.items[0].text, "Intro!");
        assert!(summaries.items[1].citations[0].is_on_page(2));
    }
}
