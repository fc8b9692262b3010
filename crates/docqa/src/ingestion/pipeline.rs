//! Ingestion pipeline: extract, chunk, and index documents
//!
//! Per-file failures are soft: an unreadable or unsupported file logs a
//! warning and contributes zero chunks, and the batch continues. Index
//! persistence failures are the hard errors and surface to the caller.

use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::types::{ChunkMetadata, DocumentChunk, SourceFormat};

use super::chunker::TextChunker;
use super::extract::ExtractorRegistry;

/// Extracts, chunks, and writes documents into a vector index
pub struct IngestPipeline {
    extractors: ExtractorRegistry,
    chunker: TextChunker,
    index: Arc<VectorIndex>,
}

/// Summary of one ingestion batch
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Files that produced at least one chunk
    pub files_ingested: usize,
    /// Files skipped after a soft extraction failure or empty content
    pub files_skipped: usize,
    /// Total chunks added to the index
    pub chunks_added: usize,
}

impl IngestPipeline {
    /// Create a pipeline with the default extractor registry
    pub fn new(chunker: TextChunker, index: Arc<VectorIndex>) -> Self {
        Self {
            extractors: ExtractorRegistry::with_defaults(),
            chunker,
            index,
        }
    }

    /// Create a pipeline with a custom extractor registry
    pub fn with_registry(
        extractors: ExtractorRegistry,
        chunker: TextChunker,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            extractors,
            chunker,
            index,
        }
    }

    /// Extract and chunk a single file without touching the index.
    ///
    /// Soft failures (unreadable, unsupported, or empty file) log a warning
    /// and yield an empty chunk list.
    pub fn process_file(&self, path: &Path) -> Vec<DocumentChunk> {
        let (format, text) = match self.extractors.extract_path(path) {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                return Vec::new();
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "file has no text content");
            return Vec::new();
        }

        let metadata = ChunkMetadata::for_document(path, format);
        let chunks = self.chunker.split(&text, &metadata);
        tracing::info!(
            path = %path.display(),
            chunks = chunks.len(),
            "file processed"
        );
        chunks
    }

    /// Extract and chunk every supported file under a directory,
    /// recursively, in walk order.
    pub fn process_directory(&self, dir: &Path) -> Result<Vec<DocumentChunk>> {
        if !dir.is_dir() {
            return Err(Error::invalid_argument(format!(
                "not a directory: {}",
                dir.display()
            )));
        }

        let mut all_chunks = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if SourceFormat::from_path(path).is_none() {
                continue;
            }
            all_chunks.extend(self.process_file(path));
        }

        tracing::info!(
            dir = %dir.display(),
            chunks = all_chunks.len(),
            "directory processed"
        );
        Ok(all_chunks)
    }

    /// Ingest a batch of files: extract, chunk, and add to the index.
    ///
    /// An empty file list is `InvalidArgument`. Per-file failures are soft;
    /// an index persistence failure surfaces as `IndexWrite` and chunks
    /// already flushed stay stored (at-least-once).
    pub async fn ingest_files(&self, paths: &[impl AsRef<Path>]) -> Result<IngestReport> {
        if paths.is_empty() {
            return Err(Error::invalid_argument("no files to ingest"));
        }

        let mut report = IngestReport::default();
        for path in paths {
            let chunks = self.process_file(path.as_ref());
            if chunks.is_empty() {
                report.files_skipped += 1;
                continue;
            }
            report.chunks_added += self.index.add(&chunks).await?;
            report.files_ingested += 1;
        }
        Ok(report)
    }

    /// Ingest every supported file under a directory
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        let chunks = self.process_directory(dir)?;
        if chunks.is_empty() {
            return Ok(IngestReport::default());
        }

        let mut report = IngestReport::default();
        report.chunks_added = self.index.add(&chunks).await?;
        report.files_ingested = count_distinct_sources(&chunks);
        Ok(report)
    }
}

fn count_distinct_sources(chunks: &[DocumentChunk]) -> usize {
    let mut sources: Vec<&str> = chunks
        .iter()
        .map(|c| c.metadata.source_path.as_str())
        .collect();
    sources.sort_unstable();
    sources.dedup();
    sources.len()
}
