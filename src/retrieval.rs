//! Keyword retrieval over a pack's chunks.
//!
//! # Scoring Algorithm
//!
//! 1. Tokenize the query and every chunk identically: lower-case, replace
//!    anything outside `[a-z0-9]` and whitespace with a space, split on
//!    whitespace.
//! 2. Score a chunk by counting the query tokens (repeats included) that
//!    occur at least once in the chunk's token set.
//! 3. Drop zero scores.
//! 4. Sort by score (desc) with a stable sort, so ties keep chunk order.
//! 5. Truncate to `top_k`.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::Chunk;

/// A chunk and its keyword score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: usize,
}

/// Lower-cased ASCII alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Rank `chunks` against `query`, best first, at most `top_k` results.
pub fn rank<'a>(chunks: &'a [Chunk], query: &str, top_k: usize) -> Vec<RankedChunk<'a>> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut results: Vec<RankedChunk<'a>> = chunks
        .iter()
        .filter_map(|chunk| {
            let tokens: HashSet<String> = tokenize(&chunk.text).into_iter().collect();
            let score = query_tokens.iter().filter(|t| tokens.contains(*t)).count();
            (score > 0).then_some(RankedChunk { chunk, score })
        })
        .collect();

    // sort_by is stable: equal scores keep their original chunk order.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(top_k);
    results
}
