//! # Sahayak
//!
//! Summarize Indian government-scheme documents in English and Telugu, and
//! answer citizens' questions about them.
//!
//! The question-answering engine itself lives in `sahayak-core`; this crate
//! wires it to configuration, the OpenRouter API, document files and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ PDF/text │──▶│   extract    │──▶│ summarize        │──▶ English + Telugu
//! └──────────┘   └──────┬───────┘   │ (SchemeAnalyzer) │
//!                       │           └──────────────────┘
//!                       ▼
//!               ┌──────────────┐    ┌──────────────────┐
//!               │  QaEngine    │◀──▶│ llm (OpenRouter) │
//!               │ (core crate) │    │ embed / generate │
//!               └──────────────┘    └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENROUTER_API_KEY=...
//! sahayak summarize scheme.pdf
//! sahayak ask scheme.pdf "Who is eligible?"
//! sahayak chat scheme.pdf
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`llm`] | OpenRouter embedding and generation providers |
//! | [`extract`] | PDF and text loading |
//! | [`summarize`] | Scheme analysis, scoring and translation |
//! | [`ask_cmd`] | `ask` and `chat` commands |
//! | [`summarize_cmd`] | `summarize` command |
//! | [`logging`] | `tracing` subscriber setup |

pub mod ask_cmd;
pub mod config;
pub mod extract;
pub mod llm;
pub mod logging;
pub mod summarize;
pub mod summarize_cmd;
