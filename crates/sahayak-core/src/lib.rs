//! # Sahayak Core
//!
//! Provider-agnostic logic for answering questions about a single
//! government-scheme document: chunking, the embedding and generation
//! provider traits, the document index, similarity ranking, the keyword
//! fallback matcher, grounded answer synthesis, and the [`qa::QaEngine`]
//! that ties them together.
//!
//! This crate performs no network or filesystem I/O. Concrete providers
//! (OpenRouter over HTTP) live in the `sahayak` app crate and are handed in
//! as trait objects.
//!
//! ```text
//!  full text ──▶ chunk ──▶ embed each ──▶ DocumentIndex
//!                                             │
//!  question ──▶ embed ──▶ rank ──┬── score > high ──▶ synthesize ──▶ Answer
//!                                │                        │ fails
//!                                └── degraded / low ──────┴──▶ keyword fallback ──▶ Answer
//! ```

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod fallback;
pub mod index;
pub mod provider;
pub mod qa;
pub mod retrieve;

#[cfg(test)]
pub(crate) mod testing;
