//! Document Q&A engine.
//!
//! [`QaEngine`] owns the index of one document at a time and answers
//! questions against it.
//!
//! # Document lifecycle
//!
//! ```text
//! Empty ──build_index──▶ Indexing ──ok──▶ Ready ──build_index──▶ Indexing ...
//!                            └──failed──▶ Empty
//! ```
//!
//! # Per-question flow (from `Ready`)
//!
//! 1. Blank question → [`AnswerResult::Error`], no provider call.
//! 2. Rank chunks; if the question can't be embedded → keyword fallback.
//! 3. Best score not above the high threshold → keyword fallback.
//! 4. Synthesize from the supporting chunks; on failure → keyword fallback.
//!
//! Provider failures therefore never reach the caller as errors. The only
//! `Error` results are input problems.
//!
//! Rebuilding takes `&mut self`, so an index can never be swapped out from
//! under an in-flight question on the same engine.

use std::sync::Arc;
use tracing::{info, warn};

use crate::answer::{combine_context, synthesize, DEFAULT_MAX_CONTEXT_CHARS};
use crate::chunk::ChunkParams;
use crate::fallback::{KeywordMatch, KeywordMatcher, PreviewLimits};
use crate::index::{build_index, DocumentIndex};
use crate::provider::{EmbeddingProvider, GenerationProvider};
use crate::retrieve::{rank, Ranking, Retrieval, Thresholds, DEFAULT_TOP_K};

pub const NOT_READY_MESSAGE: &str =
    "The Q&A engine is not ready. Please process a document first.";
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a valid question.";

/// Result of one question, rendered by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerResult {
    Answer {
        text: String,
        /// Chunks the answer was synthesized from, when requested. Empty for
        /// keyword-fallback answers.
        snippets: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl AnswerResult {
    fn answer(text: String) -> Self {
        AnswerResult::Answer {
            text,
            snippets: Vec::new(),
        }
    }

    fn error(message: &str) -> Self {
        AnswerResult::Error {
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnswerResult::Answer { .. } => "Answer",
            AnswerResult::Error { .. } => "Error",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AnswerResult::Answer { text, .. } => text,
            AnswerResult::Error { message } => message,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, AnswerResult::Answer { .. })
    }
}

/// Tunables for [`QaEngine`].
#[derive(Debug, Clone)]
pub struct QaSettings {
    pub chunking: ChunkParams,
    pub thresholds: Thresholds,
    pub top_k: usize,
    pub max_context_chars: usize,
    pub previews: PreviewLimits,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkParams::for_qa(),
            thresholds: Thresholds::default(),
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            previews: PreviewLimits::default(),
        }
    }
}

#[derive(Debug)]
enum QaState {
    Empty,
    Indexing,
    Ready(DocumentIndex),
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Empty,
    Indexing,
    Ready {
        /// `false` when every chunk embedding failed.
        semantic_search: bool,
    },
}

/// Answers questions about one document at a time.
pub struct QaEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    settings: QaSettings,
    matcher: KeywordMatcher,
    state: QaState,
}

impl QaEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        settings: QaSettings,
    ) -> Self {
        let matcher = KeywordMatcher::new(settings.previews);
        Self {
            embedder,
            generator,
            settings,
            matcher,
            state: QaState::Empty,
        }
    }

    pub fn settings(&self) -> &QaSettings {
        &self.settings
    }

    pub fn status(&self) -> EngineStatus {
        match &self.state {
            QaState::Empty => EngineStatus::Empty,
            QaState::Indexing => EngineStatus::Indexing,
            QaState::Ready(index) => EngineStatus::Ready {
                semantic_search: index.has_semantic_search(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, QaState::Ready(_))
    }

    pub fn index(&self) -> Option<&DocumentIndex> {
        match &self.state {
            QaState::Ready(index) => Some(index),
            _ => None,
        }
    }

    /// Index `full_text`, replacing any previous document.
    ///
    /// Returns `true` once the engine is ready to answer questions. That is
    /// also the case when no chunk could be embedded; questions are then
    /// answered by keyword matching.
    pub async fn build_index(&mut self, full_text: &str) -> bool {
        info!("processing document for Q&A");
        self.state = QaState::Indexing;

        match build_index(full_text, &self.settings.chunking, self.embedder.as_ref()).await {
            Ok(index) => {
                self.state = QaState::Ready(index);
                true
            }
            Err(e) => {
                warn!("could not index document: {}", e);
                self.state = QaState::Empty;
                false
            }
        }
    }

    /// Answer `question`.
    pub async fn ask(&self, question: &str) -> AnswerResult {
        self.answer(question, false).await
    }

    /// Like [`QaEngine::ask`], also returning the chunks a synthesized answer
    /// was grounded on.
    pub async fn ask_with_snippets(&self, question: &str) -> AnswerResult {
        self.answer(question, true).await
    }

    async fn answer(&self, question: &str, with_snippets: bool) -> AnswerResult {
        let QaState::Ready(index) = &self.state else {
            return AnswerResult::error(NOT_READY_MESSAGE);
        };
        if question.trim().is_empty() {
            return AnswerResult::error(EMPTY_QUESTION_MESSAGE);
        }

        info!(question, "answering question");

        if !index.has_semantic_search() {
            info!("index has no embeddings, using keyword fallback");
            return self.fallback(question, index);
        }

        let ranking = match rank(question, index, self.embedder.as_ref(), self.settings.top_k).await
        {
            Retrieval::Ranked(ranking) => ranking,
            Retrieval::Degraded(_) => return self.fallback(question, index),
        };

        let thresholds = &self.settings.thresholds;
        if !ranking.is_confident(thresholds) {
            info!(
                best = ?ranking.best().map(|c| c.score),
                high = thresholds.high,
                "best similarity below threshold, using keyword fallback"
            );
            return self.fallback(question, index);
        }

        let supporting = supporting_texts(&ranking, thresholds);
        let context = combine_context(
            supporting.iter().copied(),
            self.settings.max_context_chars,
        );

        match synthesize(self.generator.as_ref(), question, &context).await {
            Ok(text) => AnswerResult::Answer {
                text,
                snippets: if with_snippets {
                    supporting.iter().map(|s| s.to_string()).collect()
                } else {
                    Vec::new()
                },
            },
            Err(_) => self.fallback(question, index),
        }
    }

    fn fallback(&self, question: &str, index: &DocumentIndex) -> AnswerResult {
        AnswerResult::answer(self.matcher.answer(question, index))
    }

    /// Chunks among the top `max_snippets` that score above the low threshold.
    ///
    /// Empty when no document is ready or the question can't be embedded.
    pub async fn relevant_snippets(&self, question: &str, max_snippets: usize) -> Vec<String> {
        let QaState::Ready(index) = &self.state else {
            return Vec::new();
        };
        if question.trim().is_empty() || !index.has_semantic_search() {
            return Vec::new();
        }

        match rank(question, index, self.embedder.as_ref(), max_snippets).await {
            Retrieval::Ranked(ranking) => supporting_texts(&ranking, &self.settings.thresholds)
                .into_iter()
                .map(str::to_string)
                .collect(),
            Retrieval::Degraded(_) => Vec::new(),
        }
    }

    /// Raw keyword search over every chunk of the current document.
    pub fn keyword_matches(&self, question: &str, limit: usize) -> Vec<KeywordMatch> {
        match &self.state {
            QaState::Ready(index) => self.matcher.matches(question, index, limit),
            _ => Vec::new(),
        }
    }
}

fn supporting_texts<'a>(ranking: &Ranking<'a>, thresholds: &Thresholds) -> Vec<&'a str> {
    ranking
        .supporting(thresholds)
        .into_iter()
        .map(|c| c.text)
        .collect()
}
