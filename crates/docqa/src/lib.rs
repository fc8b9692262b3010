//! docqa: conversational document QA with retrieval-augmented generation
//!
//! Ingests heterogeneous documents (text, PDF, Word, Markdown), chunks them
//! with provenance metadata, indexes them in a persistent vector store, and
//! answers natural-language questions by fusing retrieved passages with
//! conversation history in a generation call.
//!
//! The embedding and generation functions are trait seams
//! ([`providers::EmbeddingProvider`], [`providers::GenerationProvider`]);
//! the built-in implementation talks to a local Ollama server. All
//! components are explicitly constructed and passed by reference, so one
//! process can host multiple independent knowledge bases.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod memory;
pub mod providers;
pub mod types;

pub use config::RagConfig;
pub use engine::{ParseOutcome, QaEngine};
pub use error::{Error, Result};
pub use index::{IndexStats, SimilarityResult, VectorIndex};
pub use ingestion::{IngestPipeline, TextChunker};
pub use memory::{ConversationMemory, ConversationTurn};
pub use types::{
    chunk::{ChunkMetadata, DocumentChunk, SourceFormat},
    response::{QaPair, QaResponse, SourceAttribution},
};
