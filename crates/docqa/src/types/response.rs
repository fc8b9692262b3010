//! Response types for question answering

use serde::{Deserialize, Serialize};

use super::chunk::DocumentChunk;

/// Excerpt length used for source attributions, in characters
pub const SOURCE_EXCERPT_CHARS: usize = 200;

/// Provenance of one retrieved passage backing an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceAttribution {
    /// Truncated excerpt of the retrieved chunk content
    pub content: String,
    /// Path of the source document
    pub source_path: String,
    /// Base name of the source file
    pub file_name: String,
}

impl SourceAttribution {
    /// Build an attribution from a retrieved chunk
    pub fn from_chunk(chunk: &DocumentChunk) -> Self {
        Self {
            content: chunk.excerpt(SOURCE_EXCERPT_CHARS),
            source_path: chunk.metadata.source_path.clone(),
            file_name: chunk.metadata.file_name.clone(),
        }
    }
}

/// Answer to a question, with source attributions
///
/// Returned for every `ask` call: on generation failure the `answer` field
/// carries a human-readable explanation and `sources` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResponse {
    /// Generated answer, or a failure explanation on the degraded path
    pub answer: String,
    /// Retrieved passages in retrieval-rank order (best match first)
    pub sources: Vec<SourceAttribution>,
    /// The question as asked
    pub question: String,
}

/// A generated question/answer pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaPair {
    /// Generated question
    pub question: String,
    /// Generated answer
    pub answer: String,
}
