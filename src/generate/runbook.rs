//! Runbook: ordered steps lifted from bullet and numbered lines.
//!
//! Every chunk is scanned line by line for a leading marker (`1.`, `2)`,
//! `-`, `*`, `•`). Each matching line becomes a step cited by the chunk it
//! was found in. When no chunk contains a single bullet line, the runbook
//! falls back to the sentences of the chunk text.

use regex::Regex;
use std::sync::OnceLock;

use crate::citation::citation_from_chunk;
use crate::models::{DocumentPack, Runbook, RunbookStep};
use crate::text::{extract_lines, split_sentences, truncate_chars};

/// Maximum steps taken from bullet lines.
pub const MAX_BULLET_STEPS: usize = 12;
/// Maximum steps taken from sentences when there are no bullets.
pub const MAX_SENTENCE_STEPS: usize = 10;

fn bullet() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| Regex::new(r"^(\d+[.)]|[-*•])\s+").expect("static regex"))
}

/// Short title: the first six words, or `Step <first 12 chars>` when those
/// words amount to three chars or fewer.
pub fn step_title(sentence: &str) -> String {
    let words = sentence.split_whitespace().take(6).collect::<Vec<_>>().join(" ");
    if words.chars().count() > 3 {
        words
    } else {
        format!("Step {}", truncate_chars(sentence, 12))
    }
}

pub fn generate_runbook(pack: &DocumentPack) -> Runbook {
    let mut steps: Vec<RunbookStep> = Vec::new();

    'chunks: for chunk in &pack.chunks {
        for line in extract_lines(&chunk.text) {
            if steps.len() >= MAX_BULLET_STEPS {
                break 'chunks;
            }
            let Some(marker) = bullet().find(line) else {
                continue;
            };
            let cleaned = line[marker.end()..].trim();
            if cleaned.is_empty() {
                continue;
            }
            steps.push(RunbookStep {
                id: format!("step_{}", steps.len() + 1),
                title: step_title(cleaned),
                instructions: vec![cleaned.to_string()],
                citations: vec![citation_from_chunk(chunk)],
            });
        }
    }

    if steps.is_empty() {
        'fallback: for chunk in &pack.chunks {
            for sentence in split_sentences(&chunk.text) {
                if steps.len() >= MAX_SENTENCE_STEPS {
                    break 'fallback;
                }
                steps.push(RunbookStep {
                    id: format!("step_{}", steps.len() + 1),
                    title: step_title(&sentence),
                    instructions: vec![sentence],
                    citations: vec![citation_from_chunk(chunk)],
                });
            }
        }
    }

    Runbook { steps }
}
