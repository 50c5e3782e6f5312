//! `sahayak ask` and `sahayak chat`.
//!
//! Both commands load one document, build a [`QaEngine`] index over it and
//! answer questions. `ask` answers once; `chat` reads questions line by
//! line until EOF or `exit`.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use sahayak_core::qa::{AnswerResult, QaEngine};
use tracing::info;

use crate::config::Config;
use crate::extract::load_document;
use crate::llm::Providers;

/// Answers containing this are followed by full-text keyword matches.
const NOT_FOUND_MARKER: &str = "couldn't find";

/// Most keyword matches listed after an answer.
const MAX_KEYWORD_MATCHES: usize = 5;

/// Output switches shared by `ask` and `chat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AskOptions {
    /// Print the chunks a synthesized answer was built from.
    pub show_context: bool,
    /// Always list keyword matches, not only after a "couldn't find" answer.
    pub full_text: bool,
}

/// Load `path` and build a ready engine.
pub async fn prepare_engine(config: &Config, providers: &Providers, path: &Path) -> Result<QaEngine> {
    let text = load_document(path).with_context(|| format!("loading {}", path.display()))?;

    let mut engine = QaEngine::new(
        providers.embedder.clone(),
        providers.answerer.clone(),
        config.qa_settings()?,
    );
    if !engine.build_index(&text).await {
        bail!("could not index {}", path.display());
    }
    info!(status = ?engine.status(), "document ready for questions");
    Ok(engine)
}

pub async fn run_ask(
    config: &Config,
    providers: &Providers,
    path: &Path,
    question: &str,
    options: AskOptions,
) -> Result<()> {
    let engine = prepare_engine(config, providers, path).await?;
    let mut stdout = std::io::stdout().lock();
    answer_one(&engine, question, options, &mut stdout).await
}

pub async fn run_chat(
    config: &Config,
    providers: &Providers,
    path: &Path,
    options: AskOptions,
) -> Result<()> {
    let engine = prepare_engine(config, providers, path).await?;
    eprintln!("Ask a question about {} (\"exit\" to quit).", path.display());
    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    chat_loop(&engine, stdin, &mut stdout, options).await
}

/// Answer every line of `input` until EOF or `exit`. Blank lines are skipped.
pub async fn chat_loop<R: BufRead, W: Write>(
    engine: &QaEngine,
    input: R,
    out: &mut W,
    options: AskOptions,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("reading question")?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        answer_one(engine, question, options, out).await?;
        writeln!(out)?;
    }
    Ok(())
}

async fn answer_one<W: Write>(
    engine: &QaEngine,
    question: &str,
    options: AskOptions,
    out: &mut W,
) -> Result<()> {
    let result = if options.show_context {
        engine.ask_with_snippets(question).await
    } else {
        engine.ask(question).await
    };

    match &result {
        AnswerResult::Answer { text, snippets } => {
            writeln!(out, "{}", text)?;
            if options.show_context && !snippets.is_empty() {
                writeln!(out, "\nContext:")?;
                for (i, snippet) in snippets.iter().enumerate() {
                    writeln!(out, "--- [{}] ---\n{}", i + 1, snippet.trim())?;
                }
            }
        }
        AnswerResult::Error { message } => {
            writeln!(out, "Error: {}", message)?;
            return Ok(());
        }
    }

    if wants_keyword_matches(result.text(), options) {
        write_keyword_matches(engine, question, out)?;
    }
    Ok(())
}

fn wants_keyword_matches(answer: &str, options: AskOptions) -> bool {
    options.full_text || answer.to_lowercase().contains(NOT_FOUND_MARKER)
}

fn write_keyword_matches<W: Write>(engine: &QaEngine, question: &str, out: &mut W) -> Result<()> {
    let matches = engine.keyword_matches(question, MAX_KEYWORD_MATCHES);
    if matches.is_empty() {
        return Ok(());
    }

    writeln!(out, "\nFull-text matches:")?;
    for m in matches {
        writeln!(
            out,
            "#{} ({}/{} keywords): {}",
            m.position + 1,
            m.score,
            m.out_of,
            m.preview
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::create_providers;
    use std::io::Cursor;

    const DOC: &str = "PM-KISAN gives income support of Rs. 6,000 per year.\n\
Eligibility: all landholding farmer families are eligible to apply.\n\
Apply online at the PM-KISAN portal with Aadhaar and bank details.";

    async fn keyword_engine() -> QaEngine {
        let providers = create_providers(&LlmConfig {
            provider: "disabled".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        let mut engine = QaEngine::new(
            providers.embedder,
            providers.answerer,
            Config::default().qa_settings().unwrap(),
        );
        assert!(engine.build_index(DOC).await);
        engine
    }

    #[test]
    fn keyword_matches_follow_not_found_in_any_case() {
        let quiet = AskOptions::default();
        assert!(wants_keyword_matches("I Couldn't Find that in the document.", quiet));
        assert!(wants_keyword_matches("COULDN'T FIND IT", quiet));
        assert!(!wants_keyword_matches("Farmers get Rs. 6,000 a year.", quiet));

        let always = AskOptions {
            full_text: true,
            ..AskOptions::default()
        };
        assert!(wants_keyword_matches("Farmers get Rs. 6,000 a year.", always));
    }

    #[tokio::test]
    async fn chat_answers_each_line_until_exit() {
        let engine = keyword_engine().await;
        let input = Cursor::new("Who is eligible?\n\n   \nexit\nWhat are the benefits?\n");
        let mut out = Vec::new();

        chat_loop(&engine, input, &mut out, AskOptions::default())
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Based on the document").count(), 1);
        assert!(out.contains("here's what I found about eligibility"));
    }

    #[tokio::test]
    async fn not_found_answer_lists_no_matches_for_unknown_words() {
        let engine = keyword_engine().await;
        let mut out = Vec::new();

        answer_one(&engine, "xyzzy plugh", AskOptions::default(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("couldn't find"));
        assert!(!out.contains("Full-text matches"));
    }

    #[tokio::test]
    async fn full_text_flag_lists_keyword_matches() {
        let engine = keyword_engine().await;
        let mut out = Vec::new();
        let options = AskOptions {
            full_text: true,
            ..AskOptions::default()
        };

        answer_one(&engine, "aadhaar bank", options, &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Full-text matches:"));
        assert!(out.contains("(2/2 keywords)"));
    }

    #[tokio::test]
    async fn blank_question_reports_error() {
        let engine = keyword_engine().await;
        let mut out = Vec::new();
        answer_one(&engine, "   ", AskOptions::default(), &mut out)
            .await
            .unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Error: "));
    }
}
