//! Recursive text chunking with overlap and provenance metadata
//!
//! Splits on a priority list of separators, preferring the coarsest one that
//! yields pieces within the target size, and merges pieces into overlapping
//! windows. Every chunk is an exact substring of the input, so concatenating
//! chunks with the overlapping regions removed reconstructs the input.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, DocumentChunk};

/// Separator priority, coarsest first. Hard character slicing is the
/// fallback when none of these occur in an oversized piece.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Text chunker with configurable size and overlap, both measured in characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// A consecutive piece of the input: byte range plus character length
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

impl TextChunker {
    /// Create a new chunker. `chunk_size` and `chunk_overlap` must be
    /// positive with `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_argument("chunk_size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::invalid_argument(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Target chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into chunks in document order, each inheriting the source
    /// metadata plus its own sequence index.
    ///
    /// Empty or whitespace-only text yields zero chunks.
    pub fn split(&self, text: &str, metadata: &ChunkMetadata) -> Vec<DocumentChunk> {
        if text.trim().is_empty() {
            tracing::debug!(source = %metadata.source_path, "empty document, no chunks produced");
            return Vec::new();
        }

        let spans = self.split_spans(text);
        tracing::debug!(
            source = %metadata.source_path,
            chunks = spans.len(),
            "document chunked"
        );

        spans
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| {
                DocumentChunk::new(text[start..end].to_string(), metadata.with_index(i as u32))
            })
            .collect()
    }

    /// Byte spans of the chunks within `text`. Spans are in document order,
    /// cover the whole input, and consecutive spans overlap by at most
    /// `chunk_overlap` characters.
    pub(crate) fn split_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut pieces = Vec::new();
        self.split_pieces(text, 0, SEPARATORS, &mut pieces);
        self.merge_pieces(&pieces)
    }

    /// Recursively split `text` (at byte offset `base` of the original) into
    /// consecutive pieces of at most `chunk_size` characters each.
    fn split_pieces(&self, text: &str, base: usize, separators: &[&str], out: &mut Vec<Piece>) {
        let chars = text.chars().count();
        if chars <= self.chunk_size {
            if !text.is_empty() {
                out.push(Piece {
                    start: base,
                    end: base + text.len(),
                    chars,
                });
            }
            return;
        }

        // Coarsest separator that actually occurs in this piece
        let sep_idx = separators.iter().position(|sep| text.contains(sep));
        let Some(idx) = sep_idx else {
            self.hard_slice(text, base, out);
            return;
        };
        let sep = separators[idx];
        let finer = &separators[idx + 1..];

        for (start, end) in split_keeping_separator(text, sep) {
            let part = &text[start..end];
            let part_chars = part.chars().count();
            if part_chars <= self.chunk_size {
                out.push(Piece {
                    start: base + start,
                    end: base + end,
                    chars: part_chars,
                });
            } else if finer.is_empty() {
                self.hard_slice(part, base + start, out);
            } else {
                self.split_pieces(part, base + start, finer, out);
            }
        }
    }

    /// Character-window fallback for text with no usable separator
    fn hard_slice(&self, text: &str, base: usize, out: &mut Vec<Piece>) {
        let mut count = 0usize;
        let mut window_start = 0usize;
        for (byte_idx, _) in text.char_indices() {
            if count == self.chunk_size {
                out.push(Piece {
                    start: base + window_start,
                    end: base + byte_idx,
                    chars: count,
                });
                window_start = byte_idx;
                count = 0;
            }
            count += 1;
        }
        if count > 0 {
            out.push(Piece {
                start: base + window_start,
                end: base + text.len(),
                chars: count,
            });
        }
    }

    /// Greedily merge consecutive pieces into windows of at most
    /// `chunk_size` characters, carrying a trailing window of at most
    /// `chunk_overlap` characters into the next chunk.
    fn merge_pieces(&self, pieces: &[Piece]) -> Vec<(usize, usize)> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            if total + piece.chars > self.chunk_size && !window.is_empty() {
                chunks.push((
                    window.front().map(|p| p.start).unwrap_or(piece.start),
                    window.back().map(|p| p.end).unwrap_or(piece.start),
                ));

                // Retain a suffix of the window as overlap for the next chunk
                while total > self.chunk_overlap
                    || (total + piece.chars > self.chunk_size && total > 0)
                {
                    if let Some(front) = window.pop_front() {
                        total -= front.chars;
                    } else {
                        break;
                    }
                }
            }
            window.push_back(piece);
            total += piece.chars;
        }

        if let (Some(front), Some(back)) = (window.front(), window.back()) {
            chunks.push((front.start, back.end));
        }

        chunks
    }
}

/// Split into consecutive byte ranges with the separator attached to the
/// preceding range, so concatenating the ranges reproduces the input.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0usize;
    for (idx, matched) in text.match_indices(sep) {
        let end = idx + matched.len();
        ranges.push((start, end));
        start = end;
    }
    if start < text.len() {
        ranges.push((start, text.len()));
    }
    ranges
}
