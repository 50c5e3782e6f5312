//! Grounded answer synthesis.
//!
//! Joins the retrieved chunks into one context block, caps its length, and
//! asks the generation provider to answer strictly from that context.

use thiserror::Error;
use tracing::{debug, warn};

use crate::chunk::truncate_chars;
use crate::provider::{GenerationProvider, GenerationRequest, ProviderError};

/// Placed between chunks in the combined context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// What the model is told to say when the context has no answer.
pub const NOT_FOUND_PHRASE: &str =
    "I couldn't find specific information about this in the document";

/// Default cap on the combined context, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 6000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that accurately answers questions \
about government schemes based only on the provided context.";

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("model returned an empty answer")]
    EmptyAnswer,
}

/// Join chunks with [`CONTEXT_SEPARATOR`], truncating to `max_chars` (plus
/// a trailing `...` when cut).
pub fn combine_context<'a>(chunks: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    let joined = chunks.into_iter().collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
    let head = truncate_chars(&joined, max_chars);
    if head.len() < joined.len() {
        format!("{head}...")
    } else {
        joined
    }
}

/// The user prompt sent to the model.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an expert assistant helping citizens understand Indian government schemes.

Based on the provided context, answer the user's question accurately and completely.

IMPORTANT GUIDELINES:
1. Answer ONLY based on the information in the context
2. If the context doesn't contain the answer, say \"{NOT_FOUND_PHRASE}\"
3. Provide detailed, specific answers when possible
4. Include relevant numbers, dates, amounts, or criteria mentioned in the context
5. Structure your answer clearly with bullet points if listing multiple items
6. Keep the language simple and easy to understand

Context from government scheme document:
---
{context}
---

User's Question: {question}

Answer:"
    )
}

/// Ask `generator` to answer `question` from `context`.
///
/// Fails if the provider fails (after its own retry) or returns only
/// whitespace. Callers are expected to fall back rather than surface this.
pub async fn synthesize(
    generator: &dyn GenerationProvider,
    question: &str,
    context: &str,
) -> Result<String, SynthesisError> {
    let prompt = build_prompt(question, context);
    debug!(
        context_chars = context.chars().count(),
        model = generator.model_name(),
        "synthesizing answer"
    );

    let request = GenerationRequest {
        system: SYSTEM_PROMPT,
        prompt: &prompt,
        temperature: TEMPERATURE,
        max_tokens: Some(MAX_TOKENS),
    };

    let answer = generator.generate(&request).await.map_err(|e| {
        warn!("answer synthesis failed: {}", e);
        SynthesisError::from(e)
    })?;

    let answer = answer.trim();
    if answer.is_empty() {
        warn!("answer synthesis returned empty text");
        return Err(SynthesisError::EmptyAnswer);
    }
    Ok(answer.to_string())
}
