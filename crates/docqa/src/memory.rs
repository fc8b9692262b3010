//! Conversation memory: an append-only ordered log of question/answer turns
//!
//! Insertion order is the only ordering guarantee. The log is unbounded;
//! a production deployment should cap or summarize old turns before this
//! is load-tested.

use serde::{Deserialize, Serialize};

/// One completed question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Question as asked
    pub question: String,
    /// Answer as returned
    pub answer: String,
    /// Position in the conversation (0-based, chronological)
    pub ordinal: usize,
}

/// Ordered log of conversation turns, oldest first
#[derive(Debug, Default, Clone)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn at the end of the log
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let ordinal = self.turns.len();
        self.turns.push(ConversationTurn {
            question: question.into(),
            answer: answer.into(),
            ordinal,
        });
    }

    /// Full ordered history, oldest first
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of recorded turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns are recorded
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Empty the log; never leaves partial state
    pub fn clear(&mut self) {
        self.turns.clear();
        tracing::info!("conversation memory cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_keep_chronological_order() {
        let mut memory = ConversationMemory::new();
        memory.append("first?", "one");
        memory.append("second?", "two");

        let history = memory.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "first?");
        assert_eq!(history[0].ordinal, 0);
        assert_eq!(history[1].answer, "two");
        assert_eq!(history[1].ordinal, 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut memory = ConversationMemory::new();
        memory.append("q", "a");
        memory.clear();
        assert!(memory.is_empty());
        // Ordinals restart after a clear
        memory.append("again?", "yes");
        assert_eq!(memory.history()[0].ordinal, 0);
    }
}
