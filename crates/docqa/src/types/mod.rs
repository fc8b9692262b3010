//! Core types for the document QA system

pub mod chunk;
pub mod response;

pub use chunk::{ChunkMetadata, DocumentChunk, SourceFormat};
pub use response::{QaPair, QaResponse, SourceAttribution};
