//! Similarity ranking of indexed chunks against a question.
//!
//! # Policy
//!
//! 1. Embed the question. If that fails the result is
//!    [`Retrieval::Degraded`], a signal to fall back, not an error.
//! 2. Score every chunk by cosine similarity and keep the top `top_k`
//!    (descending; equal scores keep chunk order).
//! 3. The ranking is trusted only if the best score is strictly greater
//!    than [`Thresholds::high`].
//! 4. Of the kept chunks, only those strictly greater than
//!    [`Thresholds::low`] are used as context.

use tracing::{debug, warn};

use crate::embedding::cosine_similarity;
use crate::index::DocumentIndex;
use crate::provider::{EmbeddingProvider, ProviderError};

/// Confidence cut-offs for semantic retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// The best chunk must score above this for the ranking to be used.
    pub high: f32,
    /// Chunks at or below this are dropped from the combined context.
    pub low: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 0.5,
            low: 0.3,
        }
    }
}

/// Number of chunks considered per question.
pub const DEFAULT_TOP_K: usize = 3;

/// A chunk and its similarity to the question.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
    /// Position of the chunk in the document index.
    pub position: usize,
    pub text: &'a str,
    pub score: f32,
}

/// Best-first ranking of the top chunks for one question.
#[derive(Debug, Clone, Default)]
pub struct Ranking<'a> {
    top: Vec<ScoredChunk<'a>>,
}

impl<'a> Ranking<'a> {
    pub fn top(&self) -> &[ScoredChunk<'a>] {
        &self.top
    }

    pub fn best(&self) -> Option<&ScoredChunk<'a>> {
        self.top.first()
    }

    /// `true` if the best score is strictly above the high threshold.
    pub fn is_confident(&self, thresholds: &Thresholds) -> bool {
        self.best().is_some_and(|c| c.score > thresholds.high)
    }

    /// Ranked chunks scoring strictly above the low threshold.
    pub fn supporting(&self, thresholds: &Thresholds) -> Vec<&ScoredChunk<'a>> {
        self.top
            .iter()
            .filter(|c| c.score > thresholds.low)
            .collect()
    }
}

/// Outcome of trying to rank an index against a question.
#[derive(Debug)]
pub enum Retrieval<'a> {
    Ranked(Ranking<'a>),
    /// No semantic ranking is possible for this question.
    Degraded(ProviderError),
}

/// Rank chunks against a precomputed question embedding.
pub fn rank_by_embedding<'a>(
    query: &[f32],
    index: &'a DocumentIndex,
    top_k: usize,
) -> Ranking<'a> {
    let mut scored: Vec<ScoredChunk<'a>> = index
        .chunks()
        .iter()
        .enumerate()
        .map(|(position, chunk)| ScoredChunk {
            position,
            text: chunk.text.as_str(),
            score: cosine_similarity(query, &chunk.embedding),
        })
        .collect();

    // Stable sort: ties keep source order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);

    Ranking { top: scored }
}

/// Embed `question` and rank the index against it.
pub async fn rank<'a>(
    question: &str,
    index: &'a DocumentIndex,
    embedder: &dyn EmbeddingProvider,
    top_k: usize,
) -> Retrieval<'a> {
    let query = match embedder.embed(question).await {
        Ok(v) => v,
        Err(e) => {
            warn!("question embedding failed, semantic ranking unavailable: {}", e);
            return Retrieval::Degraded(e);
        }
    };

    let ranking = rank_by_embedding(&query, index, top_k);
    debug!(
        scores = ?ranking.top().iter().map(|c| c.score).collect::<Vec<_>>(),
        "top similarities"
    );
    Retrieval::Ranked(ranking)
}
