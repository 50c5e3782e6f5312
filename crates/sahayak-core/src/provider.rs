//! Embedding and generation provider traits.
//!
//! The Q&A engine never talks to a model service directly; it is handed an
//! [`EmbeddingProvider`] and a [`GenerationProvider`]. Concrete HTTP clients
//! live in the app crate. Test doubles implement the same traits.
//!
//! Failures are classified into a [`ProviderError`] so callers branch on the
//! kind of failure (rate limited, unreachable, malformed reply) rather than on
//! the wording of an upstream error message.

use async_trait::async_trait;
use thiserror::Error;

/// Why a provider call failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The service asked us to slow down (HTTP 429 or an equivalent error body).
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Any other non-success HTTP status.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// Transport-level failure: DNS, connect, timeout.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The service answered, but not with what we asked for.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    /// No provider is configured.
    #[error("provider is disabled")]
    Disabled,
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"openai/text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// A single chat-style generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Maps a prompt to free text (summaries, translations, answers).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn model_name(&self) -> &str;
    /// Run one completion. Implementations return the trimmed reply text.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError>;
}
