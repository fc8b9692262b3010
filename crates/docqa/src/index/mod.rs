//! Persistent vector index with similarity search
//!
//! Embeds chunks through a pluggable `EmbeddingProvider` and keeps every
//! entry both in memory and in a JSON-lines file under the configured
//! directory. Queries are a full scan over cosine distance; scores are
//! ascending, lower is more similar.
//!
//! `add` is at-least-once: each entry is flushed before the next is
//! embedded, so a failure partway leaves earlier entries of the batch
//! durably stored. Callers re-ingesting after a failure may observe
//! duplicates; ids are content-derived, so duplicates are detectable.
//!
//! Index mutation is a critical section: `add` holds a write gate for the
//! whole batch, and `reset` takes the same gate, so a reset never runs in
//! the middle of a batch and two batches never interleave.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::DocumentChunk;

/// File name of the persisted entry log inside the index directory
const ENTRIES_FILE: &str = "entries.jsonl";

/// A stored chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Stable id derived from content and provenance
    pub id: String,
    /// Embedding vector; dimension is constant per index
    pub embedding: Vec<f32>,
    /// The chunk this entry stores
    pub chunk: DocumentChunk,
}

/// One search hit: the chunk plus its distance from the query
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    /// The retrieved chunk
    pub chunk: DocumentChunk,
    /// Cosine distance to the query; lower is more similar
    pub score: f32,
}

/// Observability snapshot of the index
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Number of stored entries
    pub total_entries: usize,
    /// Directory the index persists to
    pub persist_dir: PathBuf,
    /// Identifier of the embedding model in use
    pub embedding_model: String,
}

/// Mutable, persistent store of embedded chunks
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    persist_dir: PathBuf,
    entries: RwLock<Vec<VectorEntry>>,
    // Serializes add batches and resets; searches only need `entries`
    write_gate: tokio::sync::Mutex<()>,
}

impl VectorIndex {
    /// Open an index in `persist_dir`, loading any previously persisted
    /// entries. The directory is created if missing.
    pub fn open(persist_dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let persist_dir = persist_dir.into();
        std::fs::create_dir_all(&persist_dir)?;

        let entries = Self::load_entries(&persist_dir.join(ENTRIES_FILE))?;
        tracing::info!(
            dir = %persist_dir.display(),
            entries = entries.len(),
            model = embedder.model(),
            "vector index opened"
        );

        Ok(Self {
            embedder,
            persist_dir,
            entries: RwLock::new(entries),
            write_gate: tokio::sync::Mutex::new(()),
        })
    }

    fn load_entries(path: &Path) -> Result<Vec<VectorEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<VectorEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        line = line_no + 1,
                        error = %e,
                        "skipping corrupt index entry"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Stable id for a chunk: hash of provenance and content, so re-ingesting
    /// the same document produces the same ids.
    fn entry_id(chunk: &DocumentChunk) -> String {
        let mut hasher = Sha256::new();
        hasher.update(chunk.metadata.source_path.as_bytes());
        hasher.update(chunk.metadata.chunk_index.to_le_bytes());
        hasher.update(chunk.content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Embedding dimension this index is committed to, if any entry exists
    fn established_dimension(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.embedding.len())
    }

    /// Embed and persist a batch of chunks, returning the number added.
    ///
    /// Each entry is flushed durably before the call returns. On a
    /// persistence failure partway the error is `IndexWrite` and entries
    /// already flushed remain stored (at-least-once). The whole batch runs
    /// under the write gate, so concurrent `add` and `reset` calls wait.
    pub async fn add(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            tracing::warn!("no chunks to add");
            return Ok(0);
        }

        let _gate = self.write_gate.lock().await;

        let path = self.persist_dir.join(ENTRIES_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::index_write(format!("cannot open {}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);

        let mut added = 0usize;
        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk.content).await?;

            if let Some(expected) = self.established_dimension() {
                if embedding.len() != expected {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
            }

            let entry = VectorEntry {
                id: Self::entry_id(chunk),
                embedding,
                chunk: chunk.clone(),
            };

            let line = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", line)
                .and_then(|_| writer.flush())
                .map_err(|e| {
                    Error::index_write(format!("failed after {} entries: {}", added, e))
                })?;

            self.entries.write().push(entry);
            added += 1;
        }

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| Error::index_write(format!("sync failed: {}", e)))?;

        tracing::info!(added, total = self.len(), "chunks added to index");
        Ok(added)
    }

    /// Top-k most similar chunks for a query text, best match first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>> {
        Ok(self
            .search_with_score(query, k)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Same as `search`, exposing the raw distance for relevance filtering.
    ///
    /// Returns at most `k` results in ascending score order; fewer when the
    /// index holds fewer than `k` entries. `k == 0` is invalid input.
    pub async fn search_with_score(&self, query: &str, k: usize) -> Result<Vec<SimilarityResult>> {
        if k == 0 {
            return Err(Error::invalid_argument("k must be positive"));
        }

        let query_embedding = self.embedder.embed(query).await?;

        let entries = self.entries.read();
        let mut results: Vec<SimilarityResult> = entries
            .iter()
            .map(|entry| SimilarityResult {
                chunk: entry.chunk.clone(),
                score: cosine_distance(&query_embedding, &entry.embedding),
            })
            .collect();
        drop(entries);

        results.sort_by(|a, b| a.score.total_cmp(&b.score));
        results.truncate(k);

        tracing::debug!(k, hits = results.len(), "similarity search completed");
        Ok(results)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Observability snapshot
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_entries: self.len(),
            persist_dir: self.persist_dir.clone(),
            embedding_model: self.embedder.model().to_string(),
        }
    }

    /// Irreversibly clear all entries, in memory and on disk. Idempotent.
    /// Waits for any in-flight `add` batch before clearing.
    pub async fn reset(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut entries = self.entries.write();
        let path = self.persist_dir.join(ENTRIES_FILE);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::index_write(format!("reset failed: {}", e)))?;
        }
        entries.clear();
        tracing::info!("vector index reset");
        Ok(())
    }
}

/// Cosine distance between two vectors: 0.0 for identical direction, 2.0
/// for opposite. Falls back to the maximum distance when either vector has
/// zero magnitude.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, SourceFormat};
    use async_trait::async_trait;
    use std::path::PathBuf;

    /// Deterministic embedder: hashes words into a small fixed-size vector
    struct HashEmbedder {
        dims: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; self.dims];
            for word in text.split_whitespace() {
                let mut hasher = Sha256::new();
                hasher.update(word.to_lowercase().as_bytes());
                let digest = hasher.finalize();
                let slot = digest[0] as usize % self.dims;
                v[slot] += 1.0;
            }
            Ok(crate::providers::normalize(v))
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model(&self) -> &str {
            "hash-test"
        }
    }

    /// Embedder whose output dimension depends on input, to trip the check
    struct UnstableEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnstableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let dims = if text.len() % 2 == 0 { 4 } else { 8 };
            Ok(vec![1.0; dims])
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model(&self) -> &str {
            "unstable-test"
        }
    }

    fn chunk(content: &str, index: u32) -> DocumentChunk {
        let meta = ChunkMetadata::for_document(&PathBuf::from("/docs/sample.txt"), SourceFormat::Txt);
        DocumentChunk::new(content.to_string(), meta.with_index(index))
    }

    fn open_index(dir: &Path) -> VectorIndex {
        VectorIndex::open(dir, Arc::new(HashEmbedder { dims: 16 })).unwrap()
    }

    #[tokio::test]
    async fn add_and_search_returns_most_similar_first() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());

        index
            .add(&[
                chunk("artificial intelligence and machine learning", 0),
                chunk("cooking pasta with tomato sauce", 1),
            ])
            .await
            .unwrap();

        let results = index
            .search_with_score("artificial intelligence", 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score <= results[1].score);
        assert!(results[0].chunk.content.contains("artificial intelligence"));
    }

    #[tokio::test]
    async fn search_caps_results_at_entry_count() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        index
            .add(&[chunk("alpha", 0), chunk("beta", 1)])
            .await
            .unwrap();

        let results = index.search_with_score("alpha", 4).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn zero_k_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let err = index.search("anything", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = open_index(dir.path());
            index.add(&[chunk("persisted content", 0)]).await.unwrap();
        }
        let reopened = open_index(dir.path());
        assert_eq!(reopened.len(), 1);
        let hits = reopened.search("persisted content", 1).await.unwrap();
        assert_eq!(hits[0].content, "persisted content");
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        index.add(&[chunk("to be removed", 0)]).await.unwrap();

        index.reset().await.unwrap();
        assert!(index.is_empty());
        index.reset().await.unwrap();
        assert!(index.is_empty());

        let reopened = open_index(dir.path());
        assert!(reopened.is_empty());
    }

    /// Embedder that takes one semaphore permit per call, so a test can
    /// park an `add` batch between chunks
    struct GatedEmbedder {
        permits: Arc<tokio::sync::Semaphore>,
    }

    #[async_trait]
    impl EmbeddingProvider for GatedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let permit = self.permits.acquire().await.expect("semaphore open");
            permit.forget();
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model(&self) -> &str {
            "gated-test"
        }
    }

    #[tokio::test]
    async fn reset_waits_for_an_in_flight_batch() {
        let dir = tempfile::tempdir().unwrap();
        let permits = Arc::new(tokio::sync::Semaphore::new(1));
        let embedder = Arc::new(GatedEmbedder {
            permits: Arc::clone(&permits),
        });
        let index = Arc::new(VectorIndex::open(dir.path(), embedder).unwrap());

        let adder = {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.add(&[chunk("first", 0), chunk("second", 1)]).await })
        };

        // First chunk lands, the second embed parks on the semaphore
        while index.len() < 1 {
            tokio::task::yield_now().await;
        }

        let resetter = {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.reset().await })
        };

        // The reset must not clear anything while the batch is in flight
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!resetter.is_finished());
        assert_eq!(index.len(), 1);

        permits.add_permits(1);
        assert_eq!(adder.await.unwrap().unwrap(), 2);
        resetter.await.unwrap().unwrap();

        // The batch completed before the reset; memory and disk agree
        assert!(index.is_empty());
        let reopened = VectorIndex::open(
            dir.path(),
            Arc::new(GatedEmbedder {
                permits: Arc::new(tokio::sync::Semaphore::new(0)),
            }),
        )
        .unwrap();
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_at_add() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), Arc::new(UnstableEmbedder)).unwrap();

        // Even-length content embeds to 4 dims, odd-length to 8
        index.add(&[chunk("ab", 0)]).await.unwrap();
        let err = index.add(&[chunk("abc", 1)]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 4,
                actual: 8
            }
        ));
        // The first entry is untouched
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn failed_batch_keeps_entries_already_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), Arc::new(UnstableEmbedder)).unwrap();

        // First chunk embeds to 4 dims and lands, second trips the check
        let err = index
            .add(&[chunk("ab", 0), chunk("abc", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(index.len(), 1);

        // The flushed entry survives a reopen
        drop(index);
        let reopened = VectorIndex::open(dir.path(), Arc::new(UnstableEmbedder)).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[tokio::test]
    async fn ids_are_stable_across_reingestion() {
        let c = chunk("same content", 3);
        assert_eq!(VectorIndex::entry_id(&c), VectorIndex::entry_id(&c.clone()));
        let other = chunk("same content", 4);
        assert_ne!(VectorIndex::entry_id(&c), VectorIndex::entry_id(&other));
    }

    #[tokio::test]
    async fn stats_report_count_location_and_model() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        index.add(&[chunk("one", 0)]).await.unwrap();

        let stats = index.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.persist_dir, dir.path());
        assert_eq!(stats.embedding_model, "hash-test");
    }

    #[test]
    fn cosine_distance_basics() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 2.0);
    }
}
