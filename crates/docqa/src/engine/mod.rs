//! Retrieval-augmented question-answering engine
//!
//! Orchestrates one turn: retrieve top-k chunks for the question, assemble
//! a deterministic prompt from context, conversation history, and the
//! question, invoke the generation provider, and record the completed turn.
//!
//! The engine is stateless between calls except through the conversation
//! memory it owns; construct one engine per independent conversation.

pub mod parse;
pub mod prompt;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::{SimilarityResult, VectorIndex};
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::providers::GenerationProvider;
use crate::types::{QaPair, QaResponse, SourceAttribution};

pub use parse::ParseOutcome;
pub use prompt::PromptBuilder;

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

/// Conversational QA engine over a vector index
pub struct QaEngine {
    index: Arc<VectorIndex>,
    llm: Arc<dyn GenerationProvider>,
    memory: Mutex<ConversationMemory>,
    top_k: usize,
}

impl std::fmt::Debug for QaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaEngine")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl QaEngine {
    /// Create an engine with the default top-k
    pub fn new(index: Arc<VectorIndex>, llm: Arc<dyn GenerationProvider>) -> Self {
        Self {
            index,
            llm,
            memory: Mutex::new(ConversationMemory::new()),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Create an engine with an explicit top-k; `top_k` must be positive
    pub fn with_top_k(
        index: Arc<VectorIndex>,
        llm: Arc<dyn GenerationProvider>,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::invalid_argument("top_k must be positive"));
        }
        Ok(Self {
            index,
            llm,
            memory: Mutex::new(ConversationMemory::new()),
            top_k,
        })
    }

    /// Answer a question using retrieved context and conversation history.
    ///
    /// Empty or whitespace-only questions are rejected with
    /// `InvalidArgument` and leave no side effects. Any failure after
    /// validation (retrieval, embedding, generation) degrades to a
    /// `QaResponse` whose answer explains the failure, with empty sources;
    /// failed turns are not recorded so apology text never poisons future
    /// context.
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_argument("question must not be empty"));
        }

        match self.answer_turn(question).await {
            Ok(response) => {
                self.memory.lock().append(question, response.answer.clone());
                tracing::info!(sources = response.sources.len(), "question answered");
                Ok(response)
            }
            Err(e) => {
                tracing::error!(error = %e, "question answering failed, degrading");
                Ok(QaResponse {
                    answer: format!(
                        "Sorry, I was unable to answer this question right now: {}",
                        e
                    ),
                    sources: Vec::new(),
                    question: question.to_string(),
                })
            }
        }
    }

    /// The fallible part of one turn; `ask` maps errors to the degraded path
    async fn answer_turn(&self, question: &str) -> Result<QaResponse> {
        let hits = self.index.search_with_score(question, self.top_k).await?;

        let prompt = {
            let memory = self.memory.lock();
            PromptBuilder::build_qa_prompt(question, &hits, memory.history())
        };

        let raw = self.llm.generate(&prompt).await?;
        let answer = match parse::parse_answer(&raw) {
            ParseOutcome::Parsed(text) => text,
            ParseOutcome::Unparseable(raw) => {
                return Err(Error::generation(format!(
                    "model returned an empty answer ({} bytes of whitespace)",
                    raw.len()
                )));
            }
        };

        let sources = hits
            .iter()
            .map(|r| SourceAttribution::from_chunk(&r.chunk))
            .collect();

        Ok(QaResponse {
            answer,
            sources,
            question: question.to_string(),
        })
    }

    /// Raw retrieval without generation, for callers that only need passages
    pub async fn search_documents(&self, query: &str, k: usize) -> Result<Vec<SimilarityResult>> {
        self.index.search_with_score(query, k).await
    }

    /// Generate `count` question/answer pairs from a piece of document
    /// content. The outcome is tagged; callers must handle `Unparseable`
    /// explicitly.
    pub async fn generate_qa_pairs(
        &self,
        content: &str,
        count: usize,
    ) -> Result<ParseOutcome<Vec<QaPair>>> {
        if content.trim().is_empty() {
            return Err(Error::invalid_argument("content must not be empty"));
        }
        if count == 0 {
            return Err(Error::invalid_argument("count must be positive"));
        }

        let prompt = PromptBuilder::build_qa_pairs_prompt(content, count);
        let raw = self.llm.generate(&prompt).await?;
        let outcome = parse::parse_qa_pairs(&raw);
        if !outcome.is_parsed() {
            tracing::warn!("QA pair generation output did not parse as a JSON array");
        }
        Ok(outcome)
    }

    /// Snapshot of the conversation history, oldest first
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.memory.lock().history().to_vec()
    }

    /// Number of recorded conversation turns
    pub fn memory_len(&self) -> usize {
        self.memory.lock().len()
    }

    /// Clear the conversation memory
    pub fn clear_memory(&self) {
        self.memory.lock().clear();
    }

    /// The vector index this engine retrieves from
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}
