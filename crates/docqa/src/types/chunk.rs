//! Document chunk types with provenance metadata

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source document formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Plain text file
    Txt,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Markdown file (rendered to plain text before chunking)
    Markdown,
}

impl SourceFormat {
    /// File extensions accepted for ingestion
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &["txt", "pdf", "docx", "md"];

    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::Txt),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Detect format from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text File",
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Markdown => "Markdown",
        }
    }
}

/// Provenance metadata attached to every chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Path of the source document as given at ingestion time
    pub source_path: String,
    /// Source document format
    pub file_type: SourceFormat,
    /// Base name of the source file
    pub file_name: String,
    /// Position of this chunk within its document (0-based, document order)
    pub chunk_index: u32,
}

impl ChunkMetadata {
    /// Build document-level metadata for a path; chunk_index is filled in by the chunker
    pub fn for_document(path: &Path, file_type: SourceFormat) -> Self {
        Self {
            source_path: path.to_string_lossy().to_string(),
            file_type,
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            chunk_index: 0,
        }
    }

    /// Copy of this metadata with a different chunk index
    pub fn with_index(&self, chunk_index: u32) -> Self {
        Self {
            chunk_index,
            ..self.clone()
        }
    }
}

/// A bounded, overlapping slice of source text; the retrieval unit.
///
/// Immutable once created. Superseded only by re-ingesting the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Text content
    pub content: String,
    /// Provenance metadata
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// Create a new chunk
    pub fn new(content: String, metadata: ChunkMetadata) -> Self {
        Self { content, metadata }
    }

    /// Content truncated to at most `max_chars` characters, with an ellipsis
    /// when truncation occurred. Safe on any UTF-8 input.
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt(&self.content, max_chars)
    }
}

/// Truncate text to `max_chars` characters, appending "..." when shortened
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
