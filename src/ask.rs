//! Free-text questions answered from a pack's chunks.
//!
//! The top-ranked chunks form the context. With a completion backend the
//! answer is generated from that context; without one it is an extract of
//! the context itself. Either way the answer cites exactly the retrieved
//! chunks.

use anyhow::Result;

use crate::citation::citation_from_chunk;
use crate::completion::{CompletionBackend, CompletionOptions};
use crate::models::{Answer, DocumentPack};
use crate::retrieval::rank;
use crate::text::truncate_chars;

/// Chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

const FALLBACK_LINES: usize = 2;
const FALLBACK_CHARS: usize = 400;
const NO_CONTEXT: &str = "No relevant context found.";

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question using ONLY the context. Include a short answer.\n\nQuestion: {}\n\nContext:\n{}",
        question, context
    )
}

/// Extractive answer: the first two raw context lines, capped at 400 chars.
///
/// Lines are split on `\n` as-is, so the blank separator between two
/// chunks counts as a line and the answer stays within the best chunk.
pub fn fallback_answer(context: &str) -> String {
    let joined = context
        .split('\n')
        .take(FALLBACK_LINES)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        truncate_chars(&joined, FALLBACK_CHARS).to_string()
    }
}

/// Answer `question` from `pack`.
///
/// Backend errors are returned as-is; there is no silent fallback once a
/// backend is configured.
pub async fn ask(
    pack: &DocumentPack,
    question: &str,
    backend: Option<&dyn CompletionBackend>,
    opts: &CompletionOptions,
    top_k: usize,
) -> Result<Answer> {
    let ranked = rank(&pack.chunks, question, top_k);
    tracing::debug!(question, retrieved = ranked.len(), "ranked chunks");

    let context = ranked
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let answer = match backend {
        Some(backend) => {
            let prompt = build_prompt(question, &context);
            let text = backend.complete(&prompt, opts).await?;
            tracing::info!(provider = backend.name(), "completion received");
            text.trim().to_string()
        }
        None => fallback_answer(&context),
    };

    Ok(Answer {
        question: question.to_string(),
        answer,
        citations: ranked.iter().map(|r| citation_from_chunk(r.chunk)).collect(),
        used_chunks: ranked.iter().map(|r| r.chunk.chunk_id.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::fixtures;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        prompts: Mutex<Vec<String>>,
        reply: &'static str,
    }

    #[async_trait]
    impl CompletionBackend for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str, _opts: &CompletionOptions) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl CompletionBackend for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _prompt: &str, _opts: &CompletionOptions) -> Result<String> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn pack() -> DocumentPack {
        fixtures::sectioned(&[
            ("a", "Backups", "Backups run nightly.\nThey are kept for 30 days."),
            ("b", "Restore", "Restore from the latest backup."),
            ("c", "Other", "Unrelated text."),
        ])
    }

    #[tokio::test]
    async fn test_fallback_uses_first_two_lines() {
        let pack = pack();
        let answer = ask(&pack, "backups nightly", None, &CompletionOptions::default(), 5)
            .await
            .unwrap();
        assert_eq!(answer.answer, "Backups run nightly. They are kept for 30 days.");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.used_chunks, vec![pack.chunks[0].chunk_id.clone()]);
    }

    #[tokio::test]
    async fn test_no_matches_yield_placeholder() {
        let answer = ask(&pack(), "kubernetes", None, &CompletionOptions::default(), 5)
            .await
            .unwrap();
        assert_eq!(answer.answer, "No relevant context found.");
        assert!(answer.citations.is_empty());
        assert!(answer.used_chunks.is_empty());
    }

    #[tokio::test]
    async fn test_backend_receives_prompt_with_context() {
        let backend = Recording {
            prompts: Mutex::new(Vec::new()),
            reply: "  Nightly.  \n",
        };
        let pack = pack();
        let answer = ask(&pack, "restore backup", Some(&backend), &CompletionOptions::default(), 5)
            .await
            .unwrap();
        assert_eq!(answer.answer, "Nightly.");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Answer the question using ONLY the context. Include a short answer.\n\n\
             Question: restore backup\n\nContext:\nRestore from the latest backup."
        );
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() {
        let result = ask(&pack(), "backups", Some(&Failing), &CompletionOptions::default(), 5).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_truncates() {
        let long = "x".repeat(1000);
        assert_eq!(fallback_answer(&long).len(), 400);
        assert_eq!(fallback_answer(""), "No relevant context found.");
    }

    #[tokio::test]
    async fn test_fallback_stays_within_first_chunk() {
        let pack = fixtures::sectioned(&[
            ("a", "Backups", "Backups run nightly."),
            ("b", "Restore", "Restore the backup."),
        ]);
        let answer = ask(&pack, "backup backups", None, &CompletionOptions::default(), 5)
            .await
            .unwrap();
        assert_eq!(answer.used_chunks.len(), 2);
        assert_eq!(answer.answer, "Backups run nightly. ");
    }
}
