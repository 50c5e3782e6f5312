//! Keyword fallback matcher.
//!
//! Used when semantic retrieval is unavailable or not confident enough, and
//! when answer synthesis fails. It never fails: every call produces some
//! answer, at worst a generic "not found" hint.
//!
//! # Strategy
//!
//! 1. Classify the question into a [`Category`] by counting how many of each
//!    category's keywords occur in it. Highest count wins; ties go to the
//!    category declared first.
//! 2. With a category, return the longest chunk containing any of that
//!    category's keywords.
//! 3. Otherwise score each chunk by how many whitespace-separated question
//!    tokens it contains and return the best one.
//! 4. If nothing scores, return [`NOT_FOUND_MESSAGE`].

use crate::chunk::preview;
use crate::index::DocumentIndex;

/// Returned when no chunk shares anything with the question.
pub const NOT_FOUND_MESSAGE: &str = "I couldn't find specific information about your question in the document. \
Please try asking about eligibility criteria, benefits, or the application process.";

/// Intent of a question about a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Eligibility,
    Benefits,
    Application,
    Documents,
    Deadline,
}

impl Category {
    /// Declaration order doubles as tie-break order.
    pub const ALL: [Category; 5] = [
        Category::Eligibility,
        Category::Benefits,
        Category::Application,
        Category::Documents,
        Category::Deadline,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Eligibility => &[
                "eligible",
                "eligibility",
                "who can apply",
                "criteria",
                "qualification",
            ],
            Category::Benefits => &[
                "benefit",
                "benefits",
                "advantage",
                "what will i get",
                "amount",
            ],
            Category::Application => &["apply", "application", "how to", "process", "register"],
            Category::Documents => &["documents", "papers", "required", "need"],
            Category::Deadline => &["last date", "deadline", "when", "time"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Eligibility => "eligibility",
            Category::Benefits => "benefits",
            Category::Application => "the application process",
            Category::Documents => "required documents",
            Category::Deadline => "deadlines",
        }
    }

    fn hits(self, lowered: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|k| lowered.contains(*k))
            .count()
    }

    fn matches(self, lowered: &str) -> bool {
        self.keywords().iter().any(|k| lowered.contains(k))
    }
}

/// Pick the category with the most keyword hits in `question`.
///
/// Returns `None` when no category keyword occurs at all.
pub fn classify(question: &str) -> Option<Category> {
    let lowered = question.to_lowercase();
    let mut best: Option<(Category, usize)> = None;
    for category in Category::ALL {
        let hits = category.hits(&lowered);
        if hits > best.map_or(0, |(_, h)| h) {
            best = Some((category, hits));
        }
    }
    best.map(|(c, _)| c)
}

/// Lower-cased whitespace tokens of a question.
pub fn question_tokens(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Number of `tokens` that occur (as substrings) in `text`.
pub fn keyword_score(tokens: &[String], text: &str) -> usize {
    let lowered = text.to_lowercase();
    tokens
        .iter()
        .filter(|t| lowered.contains(t.as_str()))
        .count()
}

/// Preview lengths, in characters, for fallback answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    /// Chunk preview for a category match.
    pub category_chars: usize,
    /// Chunk preview for a raw keyword match.
    pub keyword_chars: usize,
    /// Per-match preview in [`KeywordMatcher::matches`].
    pub match_chars: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self {
            category_chars: 500,
            keyword_chars: 400,
            match_chars: 300,
        }
    }
}

/// A chunk found by raw keyword overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub position: usize,
    /// Number of question tokens found in the chunk.
    pub score: usize,
    /// Number of tokens in the question.
    pub out_of: usize,
    pub preview: String,
}

/// Non-semantic answer finder over a [`DocumentIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher {
    limits: PreviewLimits,
}

impl KeywordMatcher {
    pub fn new(limits: PreviewLimits) -> Self {
        Self { limits }
    }

    /// Best-effort answer for `question`. Always returns non-empty text.
    pub fn answer(&self, question: &str, index: &DocumentIndex) -> String {
        if let Some(category) = classify(question) {
            if let Some(chunk) = longest_matching(index, category) {
                return format!(
                    "Based on the document, here's what I found about {}:\n\n{}",
                    category.label(),
                    preview(chunk, self.limits.category_chars)
                );
            }
        }

        let tokens = question_tokens(question);
        let mut best: Option<(&str, usize)> = None;
        for text in index.chunk_texts() {
            let score = keyword_score(&tokens, text);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((text, score));
            }
        }

        match best {
            Some((chunk, _)) => format!(
                "Based on the document, here's relevant information:\n\n{}",
                preview(chunk, self.limits.keyword_chars)
            ),
            None => NOT_FOUND_MESSAGE.to_string(),
        }
    }

    /// Chunks sharing at least one token with `question`, best first.
    pub fn matches(&self, question: &str, index: &DocumentIndex, limit: usize) -> Vec<KeywordMatch> {
        let tokens = question_tokens(question);
        let mut found: Vec<(usize, usize, &str)> = index
            .chunk_texts()
            .enumerate()
            .map(|(position, text)| (position, keyword_score(&tokens, text), text))
            .filter(|(_, score, _)| *score > 0)
            .collect();

        found.sort_by(|a, b| b.1.cmp(&a.1));
        found
            .into_iter()
            .take(limit)
            .map(|(position, score, text)| KeywordMatch {
                position,
                score,
                out_of: tokens.len(),
                preview: preview(text, self.limits.match_chars),
            })
            .collect()
    }
}

/// Longest chunk mentioning any keyword of `category`; first wins on equal length.
fn longest_matching(index: &DocumentIndex, category: Category) -> Option<&str> {
    let mut best: Option<&str> = None;
    for text in index.chunk_texts() {
        if !category.matches(&text.to_lowercase()) {
            continue;
        }
        if best.map_or(true, |b| text.chars().count() > b.chars().count()) {
            best = Some(text);
        }
    }
    best
}
