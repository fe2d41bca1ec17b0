//! Tables: an overview row per section (word count) or page (char count).
//!
//! The first table is also rendered as Markdown and CSV.

use crate::citation::{cite_page, cite_section};
use crate::models::{DocumentPack, Structure, Table, TableRow, Tables};
use crate::text::char_len;

pub fn generate_tables(pack: &DocumentPack) -> Tables {
    let table = match &pack.structure {
        Structure::Sectioned(sections) => Table {
            id: "sections_table".to_string(),
            title: "Sections overview".to_string(),
            rows: sections
                .iter()
                .map(|section| TableRow {
                    cells: vec![
                        section.title.clone(),
                        format!("{} words", section.text.split_whitespace().count()),
                    ],
                    citations: cite_section(&pack.chunks, &section.section_id),
                })
                .collect(),
        },
        Structure::Paged(pages) => Table {
            id: "pages_table".to_string(),
            title: "Pages overview".to_string(),
            rows: pages
                .iter()
                .map(|page| TableRow {
                    cells: vec![
                        format!("Page {}", page.page_number),
                        format!("{} chars", char_len(&page.text)),
                    ],
                    citations: cite_page(&pack.chunks, page.page_number),
                })
                .collect(),
        },
    };

    Tables {
        markdown: Some(to_markdown(&table)),
        csv: Some(to_csv(&table)),
        tables: vec![table],
    }
}

/// Markdown rendering with generic `Col N` headers.
pub fn to_markdown(table: &Table) -> String {
    let (header, rule) = match table.rows.first() {
        Some(row) => (
            (1..=row.cells.len())
                .map(|i| format!("Col {}", i))
                .collect::<Vec<_>>()
                .join(" | "),
            vec!["---"; row.cells.len()].join(" | "),
        ),
        None => ("Column".to_string(), "---".to_string()),
    };
    let mut lines = vec![format!("| {} |", header), format!("| {} |", rule)];
    lines.extend(
        table
            .rows
            .iter()
            .map(|row| format!("| {} |", row.cells.join(" | "))),
    );
    lines.join("\n")
}

/// CSV rendering: every cell quoted, embedded quotes doubled.
pub fn to_csv(table: &Table) -> String {
    table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| csv_escape(cell))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_escape(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::fixtures;

    #[test]
    fn section_rows_count_words() {
        let pack = fixtures::sectioned(&[
            ("a", "Intro", "one two  three"),
            ("b", "Say \"hi\"", "four"),
        ]);
        let tables = generate_tables(&pack);
        let table = &tables.tables[0];
        assert_eq!(table.id, "sections_table");
        assert_eq!(table.rows[0].cells, vec!["Intro", "3 words"]);
        assert_eq!(
            tables.markdown.as_deref().unwrap(),
            "| Col 1 | Col 2 |\n| --- | --- |\n| Intro | 3 words |\n| Say \"hi\" | 1 words |"
        );
        assert_eq!(
            tables.csv.as_deref().unwrap(),
            "\"Intro\",\"3 words\"\n\"Say \"\"hi\"\"\",\"1 words\""
        );
    }

    #[test]
    fn page_rows_count_chars() {
        let pack = fixtures::paged(&["héllo", ""]);
        let tables = generate_tables(&pack);
        let table = &tables.tables[0];
        assert_eq!(table.id, "pages_table");
        assert_eq!(table.rows[0].cells, vec!["Page 1", "5 chars"]);
        assert!(table.rows[1].citations.is_empty());
    }

    #[test]
    fn empty_table_markdown_has_placeholder_header() {
        let table = Table {
            id: "t".into(),
            title: "T".into(),
            rows: vec![],
        };
        assert_eq!(to_markdown(&table), "| Column |\n| --- |");
        assert_eq!(to_csv(&table), "");
    }
}
