//! Deterministic prompt assembly for retrieval-augmented generation

use crate::index::SimilarityResult;
use crate::memory::ConversationTurn;

/// Prompt builder for conversational QA
pub struct PromptBuilder;

impl PromptBuilder {
    /// Numbered context block from retrieved chunks, in retrieval-rank order
    pub fn build_context(results: &[SimilarityResult]) -> String {
        let mut context = String::new();
        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {} ({})\n{}\n\n",
                i + 1,
                result.chunk.metadata.file_name,
                result.chunk.metadata.source_path,
                result.chunk.content
            ));
        }
        context
    }

    /// Conversation history block, oldest turn first
    fn build_history(history: &[ConversationTurn]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let turns: Vec<String> = history
            .iter()
            .map(|t| format!("Q: {}\nA: {}", t.question, t.answer))
            .collect();
        format!("\nCONVERSATION SO FAR:\n{}\n", turns.join("\n\n"))
    }

    /// The full conversational RAG prompt: fixed preamble, retrieved context
    /// in rank order, full history, then the current question. Identical
    /// inputs always assemble the identical prompt.
    pub fn build_qa_prompt(
        question: &str,
        results: &[SimilarityResult],
        history: &[ConversationTurn],
    ) -> String {
        format!(
            r#"You are a professional assistant that answers questions using the context below.

CONTEXT FROM DOCUMENTS:
{context}{history}
QUESTION: {question}

Answer accurately and in detail using the context. If the context does not contain the relevant information, say clearly that the answer cannot be found in the provided documents.

Answer:"#,
            context = Self::build_context(results),
            history = Self::build_history(history),
            question = question
        )
    }

    /// Prompt asking for `count` question/answer pairs as a strict JSON array
    pub fn build_qa_pairs_prompt(content: &str, count: usize) -> String {
        format!(
            r#"You are an expert at generating study questions from documents. Based on the document below, generate {count} high-quality question/answer pairs. Questions should probe understanding, application, and analysis rather than surface recall; answers must be accurate and concise.

Output ONLY a JSON array, no explanations, in exactly this shape:
[{{"question": "...", "answer": "..."}}]

DOCUMENT:
{content}"#,
            count = count,
            content = content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, DocumentChunk, SourceFormat};
    use std::path::PathBuf;

    fn result(content: &str, file: &str) -> SimilarityResult {
        let meta = ChunkMetadata::for_document(&PathBuf::from(file), SourceFormat::Txt);
        SimilarityResult {
            chunk: DocumentChunk::new(content.to_string(), meta),
            score: 0.1,
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let results = vec![result("fact one", "/a.txt"), result("fact two", "/b.txt")];
        let history = vec![ConversationTurn {
            question: "earlier?".into(),
            answer: "yes".into(),
            ordinal: 0,
        }];
        let p1 = PromptBuilder::build_qa_prompt("now?", &results, &history);
        let p2 = PromptBuilder::build_qa_prompt("now?", &results, &history);
        assert_eq!(p1, p2);
    }

    #[test]
    fn prompt_orders_context_by_rank_and_history_oldest_first() {
        let results = vec![result("best match", "/a.txt"), result("second match", "/b.txt")];
        let history = vec![
            ConversationTurn {
                question: "old?".into(),
                answer: "old answer".into(),
                ordinal: 0,
            },
            ConversationTurn {
                question: "new?".into(),
                answer: "new answer".into(),
                ordinal: 1,
            },
        ];
        let prompt = PromptBuilder::build_qa_prompt("current?", &results, &history);

        let best = prompt.find("best match").unwrap();
        let second = prompt.find("second match").unwrap();
        assert!(best < second);

        let old = prompt.find("old?").unwrap();
        let new = prompt.find("new?").unwrap();
        assert!(old < new);

        assert!(prompt.contains("QUESTION: current?"));
    }

    #[test]
    fn empty_history_adds_no_history_block() {
        let prompt = PromptBuilder::build_qa_prompt("q?", &[], &[]);
        assert!(!prompt.contains("CONVERSATION SO FAR"));
    }
}
