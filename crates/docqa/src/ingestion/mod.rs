//! Document ingestion: extraction, chunking, and the pipeline gluing them
//! to the vector index

pub mod chunker;
pub mod extract;
pub mod pipeline;

pub use chunker::TextChunker;
pub use extract::{ExtractorRegistry, TextExtractor};
pub use pipeline::IngestPipeline;
