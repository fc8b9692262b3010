//! Provider abstractions for embeddings and answer generation
//!
//! Trait seams for the two external collaborators: the embedding function
//! and the generation function. The built-in implementation talks to a
//! local Ollama server; tests supply deterministic in-process providers.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::{normalize, EmbeddingProvider};
pub use llm::GenerationProvider;
pub use ollama::OllamaClient;
