//! Per-document chunk/embedding index.
//!
//! [`build_index`] chunks a document and embeds each chunk sequentially.
//! A chunk whose embedding call fails is kept with a zero vector so it stays
//! available to the keyword matcher; it simply never ranks semantically.
//! The index is immutable once built. Replacing the document means building
//! a new index.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chunk::ChunkParams;
use crate::embedding::zero_vector;
use crate::provider::EmbeddingProvider;

/// Why an index could not be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("document contains no text to index")]
    EmptyDocument,
}

/// One chunk of the source document and its embedding.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    /// Real embedding, or a zero vector when the provider failed.
    pub embedding: Vec<f32>,
    /// `false` when `embedding` is a zero-vector placeholder.
    pub embedded: bool,
}

/// Chunks of one document in source order, plus the full text.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<IndexedChunk>,
    full_text: String,
}

impl DocumentIndex {
    /// Assemble an index from already-embedded chunks.
    pub fn from_chunks(full_text: impl Into<String>, chunks: Vec<IndexedChunk>) -> Self {
        Self {
            chunks,
            full_text: full_text.into(),
        }
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    pub fn chunk_texts(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.chunks.iter().map(|c| c.text.as_str())
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn embedded_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.embedded).count()
    }

    /// `false` when not a single chunk could be embedded; questions are then
    /// answered by keyword matching alone.
    pub fn has_semantic_search(&self) -> bool {
        self.chunks.iter().any(|c| c.embedded)
    }
}

/// Chunk `full_text` and embed every chunk.
///
/// Fails only for a document with no non-whitespace text. Embedding
/// failures are absorbed per chunk; check
/// [`DocumentIndex::has_semantic_search`] to learn whether any succeeded.
pub async fn build_index(
    full_text: &str,
    params: &ChunkParams,
    embedder: &dyn EmbeddingProvider,
) -> Result<DocumentIndex, IndexError> {
    if full_text.trim().is_empty() {
        return Err(IndexError::EmptyDocument);
    }

    let texts = params.split(full_text);
    if texts.is_empty() {
        return Err(IndexError::EmptyDocument);
    }

    info!(
        chunks = texts.len(),
        model = embedder.model_name(),
        "embedding document chunks"
    );

    let dims = embedder.dims();
    let total = texts.len();
    let mut chunks = Vec::with_capacity(total);

    for (i, text) in texts.into_iter().enumerate() {
        debug!("embedding chunk {}/{}", i + 1, total);
        let chunk = match embedder.embed(&text).await {
            Ok(embedding) => IndexedChunk {
                text,
                embedding,
                embedded: true,
            },
            Err(e) => {
                warn!("embedding failed for chunk {}/{}: {}", i + 1, total, e);
                IndexedChunk {
                    text,
                    embedding: zero_vector(dims),
                    embedded: false,
                }
            }
        };
        chunks.push(chunk);
    }

    let index = DocumentIndex::from_chunks(full_text, chunks);
    if index.has_semantic_search() {
        info!(
            embedded = index.embedded_count(),
            chunks = index.len(),
            "document index ready"
        );
    } else {
        warn!(
            chunks = index.len(),
            "no chunk could be embedded; index is ready without semantic search"
        );
    }

    Ok(index)
}
