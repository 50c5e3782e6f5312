//! `sahayak summarize`.
//!
//! Prints the English summary, its Telugu translation and the analysis
//! metadata, or the whole [`BilingualSummary`] as JSON with `--json`.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::extract::load_document;
use crate::llm::Providers;
use crate::summarize::{summarize_bilingual, BilingualSummary, SchemeAnalyzer};

pub async fn run_summarize(
    config: &Config,
    providers: &Providers,
    path: &Path,
    url: Option<&str>,
    json: bool,
) -> Result<()> {
    let text = load_document(path).with_context(|| format!("loading {}", path.display()))?;
    let analyzer = SchemeAnalyzer::new(providers.summarizer.clone(), config.summary_chunking()?)?;

    let summary = summarize_bilingual(&analyzer, providers.translator.as_ref(), &text, url).await;

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &summary)?;
        writeln!(stdout)?;
    } else {
        write_report(&mut stdout, &summary)?;
    }
    Ok(())
}

/// Human-readable rendering of a summary.
pub fn write_report<W: Write>(out: &mut W, summary: &BilingualSummary) -> Result<()> {
    let analysis = &summary.analysis;

    writeln!(out, "Scheme: {}", analysis.scheme_name)?;
    writeln!(out, "Confidence: {:.0}%", analysis.confidence_score * 100.0)?;
    writeln!(out, "Source words: {}", analysis.word_count)?;
    if !analysis.missing_sections.is_empty() {
        writeln!(out, "Missing sections: {}", analysis.missing_sections.join(", "))?;
    }

    writeln!(out, "\n=== English ===\n\n{}", summary.english)?;
    writeln!(out, "\n=== తెలుగు (Telugu) ===\n\n{}", summary.telugu)?;

    if let Some(details) = &analysis.details {
        let lists = [
            ("Amounts", &details.financial_amounts),
            ("Contact numbers", &details.contact_numbers),
            ("Websites", &details.websites),
        ];
        for (label, values) in lists {
            if !values.is_empty() {
                writeln!(out, "\n{}: {}", label, values.join(", "))?;
            }
        }
    }
    Ok(())
}
