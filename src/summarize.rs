//! Scheme summarization and translation.
//!
//! # Pipeline
//!
//! ```text
//! document text
//!   │ scheme name (labelled line → capitalised phrase → "Pradhan Mantri …" → URL)
//!   │ chunk (summary window)
//!   ▼
//! summarize each chunk ──(failed chunks skipped)──► consolidate
//!                                                     │ on failure: join chunk summaries
//!                                                     ▼
//!                            confidence · missing sections · SchemeDetails
//!                                                     │
//!                                                     ▼
//!                                             translate to Telugu
//! ```
//!
//! Every model call goes through a [`GenerationProvider`], so the whole
//! pipeline runs against fakes in tests.

use std::sync::Arc;

use anyhow::Result;
use regex::Regex;
use sahayak_core::answer::CONTEXT_SEPARATOR;
use sahayak_core::chunk::ChunkParams;
use sahayak_core::provider::{GenerationProvider, GenerationRequest, ProviderError};
use serde::Serialize;
use tracing::{info, warn};

/// Summary text used when no chunk could be summarized.
pub const ANALYSIS_FAILED_SUMMARY: &str = "Error: Could not analyze the scheme content.";
/// Telugu side of a [`BilingualSummary`] when translation fails.
pub const TRANSLATION_UNAVAILABLE: &str = "Translation not available.";
/// Placeholder for a section that is absent from the summary.
pub const NOT_SPECIFIED: &str = "Not specified";
pub const UNKNOWN_SCHEME: &str = "Unknown Scheme";

const SUMMARY_TEMPLATE: &str = "Consolidated Summary: [Scheme Name]

1. Eligibility

Who can apply (age, gender, income, occupation, etc.)

Required conditions (BPL, disability, widowhood, etc.)

2. Benefits

Financial benefits and assistance amounts

Mode of transfer (DBT, PFMS, etc.)

Monitoring or review mechanisms (if any)

3. How to Apply

Application steps

Where to apply (Gram Panchayat, online portal, etc.)

Required documents

Approval and disbursement process

4. Additional Information (if available)

Scheme objectives

Implementing ministry/department

Helpline or grievance redressal mechanism";

const SCORE_KEYWORDS: [&str; 10] = [
    "apply",
    "eligible",
    "benefits",
    "documents",
    "amount",
    "process",
    "ministry",
    "department",
    "helpline",
    "grievance",
];

const OFFICIAL_TERMS: [&str; 8] = [
    "government",
    "official",
    "portal",
    "authority",
    "approved",
    "verified",
    "guidelines",
    "procedure",
];

/// The four headings every summary is asked to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Eligibility,
    Benefits,
    HowToApply,
    AdditionalInformation,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Eligibility,
        Section::Benefits,
        Section::HowToApply,
        Section::AdditionalInformation,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Eligibility => "Eligibility",
            Section::Benefits => "Benefits",
            Section::HowToApply => "How to Apply",
            Section::AdditionalInformation => "Additional Information",
        }
    }

    /// Words that count as covering the section even without its heading.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Section::Eligibility => &["eligible", "who can apply", "criteria", "qualification"],
            Section::Benefits => &["benefit", "amount", "financial", "assistance", "support"],
            Section::HowToApply => &["apply", "application", "process", "steps", "procedure"],
            Section::AdditionalInformation => {
                &["objective", "ministry", "department", "helpline", "contact"]
            }
        }
    }
}

/// Fields pulled out of a consolidated summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeDetails {
    pub scheme_name: String,
    pub eligibility: String,
    pub benefits: String,
    pub application_process: String,
    pub additional_info: String,
    pub financial_amounts: Vec<String>,
    pub contact_numbers: Vec<String>,
    pub websites: Vec<String>,
}

/// Result of [`SchemeAnalyzer::analyze`].
#[derive(Debug, Clone, Serialize)]
pub struct SchemeAnalysis {
    pub summary: String,
    pub confidence_score: f64,
    pub scheme_name: String,
    pub missing_sections: Vec<String>,
    /// Absent when no chunk could be summarized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SchemeDetails>,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SchemeAnalysis {
    pub fn succeeded(&self) -> bool {
        self.details.is_some()
    }
}

/// English summary with its Telugu translation.
#[derive(Debug, Clone, Serialize)]
pub struct BilingualSummary {
    pub english: String,
    pub telugu: String,
    pub analysis: SchemeAnalysis,
}

struct Patterns {
    labelled_name: Regex,
    phrase_name: Regex,
    pradhan_mantri_name: Regex,
    specific_figure: Regex,
    amount: Regex,
    phone: Regex,
    website: Regex,
}

impl Patterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            labelled_name: Regex::new(r"(?i)(?:Scheme|Yojana|Programme|Project):\s*([^\n]+)")?,
            phrase_name: Regex::new(r"(?i)([A-Z][a-zA-Z\s]*(?:Scheme|Yojana|Programme|Project))")?,
            pradhan_mantri_name: Regex::new(r"(?i)Pradhan Mantri\s+([A-Za-z\s]+(?:Scheme|Yojana))")?,
            specific_figure: Regex::new(r"Rs\.\s*\d+|₹\s*\d+|\d{4}")?,
            amount: Regex::new(r"(?:Rs\.|₹)\s*[\d,]+")?,
            phone: Regex::new(r"(?:\+?\d{2,3}[-.\s]?)?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}")?,
            website: Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#)?,
        })
    }
}

/// Summarizes a scheme document and scores the result.
pub struct SchemeAnalyzer {
    summarizer: Arc<dyn GenerationProvider>,
    chunking: ChunkParams,
    patterns: Patterns,
}

impl SchemeAnalyzer {
    pub fn new(summarizer: Arc<dyn GenerationProvider>, chunking: ChunkParams) -> Result<Self> {
        Ok(Self {
            summarizer,
            chunking,
            patterns: Patterns::compile()?,
        })
    }

    /// Summarize `text` and derive the scheme name, confidence score,
    /// missing sections and structured details.
    ///
    /// Never fails: when no chunk can be summarized the analysis carries
    /// [`ANALYSIS_FAILED_SUMMARY`] with a zero score.
    pub async fn analyze(&self, text: &str, url: Option<&str>) -> SchemeAnalysis {
        info!("starting scheme analysis");
        let scheme_name = self.scheme_name(text, url.unwrap_or_default());
        let word_count = text.split_whitespace().count();

        let chunks = self.chunking.split(text);
        info!("processing {} chunks for analysis", chunks.len());

        let mut chunk_summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            info!("analyzing chunk {}/{}", i + 1, chunks.len());
            match self.summarize_chunk(chunk).await {
                Ok(summary) => chunk_summaries.push(summary),
                Err(e) => warn!("chunk {} summary failed: {}", i + 1, e),
            }
        }

        if chunk_summaries.is_empty() {
            return SchemeAnalysis {
                summary: ANALYSIS_FAILED_SUMMARY.to_string(),
                confidence_score: 0.0,
                scheme_name,
                missing_sections: vec!["All sections".to_string()],
                details: None,
                word_count,
                url: url.map(str::to_string),
            };
        }

        let summary = self.consolidate(&chunk_summaries).await;
        let details = self.extract_details(&summary, &scheme_name);

        SchemeAnalysis {
            confidence_score: self.confidence_score(&summary),
            missing_sections: missing_sections(&summary),
            details: Some(details),
            summary,
            scheme_name,
            word_count,
            url: url.map(str::to_string),
        }
    }

    /// Best guess at the scheme's name from the text, then the URL.
    pub fn scheme_name(&self, text: &str, url: &str) -> String {
        let p = &self.patterns;
        for re in [&p.labelled_name, &p.phrase_name, &p.pradhan_mantri_name] {
            if let Some(name) = re.captures(text).and_then(|c| c.get(1)) {
                return name.as_str().trim().to_string();
            }
        }

        url.split('/')
            .find(|part| {
                let part = part.to_lowercase();
                ["scheme", "yojana", "pm"].iter().any(|k| part.contains(k))
            })
            .map(|part| title_case(&part.replace('-', " ")))
            .unwrap_or_else(|| UNKNOWN_SCHEME.to_string())
    }

    /// Quality score in `[0, 1]` for a consolidated summary.
    pub fn confidence_score(&self, summary: &str) -> f64 {
        let lower = summary.to_lowercase();
        let mut score = 0.0;

        for section in Section::ALL {
            if lower.contains(&section.title().to_lowercase()) {
                score += 0.2;
            }
        }

        let keyword_hits = SCORE_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
        score += keyword_hits as f64 / SCORE_KEYWORDS.len() as f64 * 0.2;

        let words = summary.split_whitespace().count();
        if (100..=800).contains(&words) {
            score += 0.2;
        }

        if self.patterns.specific_figure.is_match(summary) {
            score += 0.1;
        }

        let official = OFFICIAL_TERMS.iter().filter(|t| lower.contains(*t)).count();
        if official >= 2 {
            score += 0.1;
        }

        f64::min(score, 1.0)
    }

    fn extract_details(&self, summary: &str, scheme_name: &str) -> SchemeDetails {
        let sections = split_sections(summary);
        let section = |s: Section| {
            sections[s as usize]
                .clone()
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| NOT_SPECIFIED.to_string())
        };
        let all = |re: &Regex| {
            re.find_iter(summary)
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        };

        SchemeDetails {
            scheme_name: scheme_name.to_string(),
            eligibility: section(Section::Eligibility),
            benefits: section(Section::Benefits),
            application_process: section(Section::HowToApply),
            additional_info: section(Section::AdditionalInformation),
            financial_amounts: all(&self.patterns.amount),
            contact_numbers: all(&self.patterns.phone),
            websites: all(&self.patterns.website),
        }
    }

    async fn summarize_chunk(&self, chunk: &str) -> Result<String, ProviderError> {
        let prompt = format!(
            "You are an expert assistant summarizing Indian government schemes for official documentation.

Summarize the following text from a government scheme document in the EXACT format below:

{SUMMARY_TEMPLATE}

IMPORTANT GUIDELINES:
- Use official government-style tone
- Avoid redundant text or assumptions
- If information is not available, write \"Not specified on the site\"
- Extract the actual scheme name from the content
- Be precise and factual

Text to summarize:
---
{chunk}
---

Summary:"
        );
        let request = GenerationRequest {
            system: "You are a helpful assistant that summarizes government schemes in official format.",
            prompt: &prompt,
            temperature: 0.2,
            max_tokens: None,
        };
        non_empty(self.summarizer.generate(&request).await?)
    }

    async fn consolidate(&self, chunk_summaries: &[String]) -> String {
        let combined = chunk_summaries.join(CONTEXT_SEPARATOR);
        let prompt = format!(
            "You are an expert editor consolidating multiple summaries of an Indian government scheme.

Combine the following summaries into ONE comprehensive summary in the EXACT format below:

{SUMMARY_TEMPLATE}

IMPORTANT GUIDELINES:
- Use official government-style tone
- Avoid redundant text or assumptions
- If information is not available, write \"Not specified on the site\"
- Ensure all sections are properly formatted
- Remove any duplicate information
- Be precise and factual

Summaries to consolidate:
---
{combined}
---

Final Consolidated Summary:"
        );
        let request = GenerationRequest {
            system: "You are an expert editor that consolidates government scheme summaries.",
            prompt: &prompt,
            temperature: 0.1,
            max_tokens: None,
        };

        match self.summarizer.generate(&request).await.and_then(non_empty) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("consolidation failed, joining chunk summaries: {}", e);
                chunk_summaries.join("\n\n")
            }
        }
    }
}

/// Translate English text to Telugu, keeping headings and bullets.
pub async fn translate(
    translator: &dyn GenerationProvider,
    text: &str,
) -> Result<String, ProviderError> {
    let prompt = format!(
        "Translate the following English text to Telugu.
Preserve the structure, including bullet points and headings.
Only provide the translated Telugu text, nothing else.

English Text:
---
{text}
---

Telugu Translation:"
    );
    let request = GenerationRequest {
        system: "You are a precise translator from English to Telugu.",
        prompt: &prompt,
        temperature: 0.1,
        max_tokens: None,
    };
    non_empty(translator.generate(&request).await?)
}

/// Analyze a document and translate the resulting summary.
///
/// Translation is skipped when the analysis itself failed; a failed
/// translation leaves [`TRANSLATION_UNAVAILABLE`] on the Telugu side.
pub async fn summarize_bilingual(
    analyzer: &SchemeAnalyzer,
    translator: &dyn GenerationProvider,
    text: &str,
    url: Option<&str>,
) -> BilingualSummary {
    let analysis = analyzer.analyze(text, url).await;

    let telugu = if analysis.succeeded() {
        info!("translating summary to Telugu");
        translate(translator, &analysis.summary)
            .await
            .unwrap_or_else(|e| {
                warn!("translation failed: {}", e);
                TRANSLATION_UNAVAILABLE.to_string()
            })
    } else {
        TRANSLATION_UNAVAILABLE.to_string()
    };

    BilingualSummary {
        english: analysis.summary.clone(),
        telugu,
        analysis,
    }
}

/// Sections with neither their heading nor any of their keywords present.
pub fn missing_sections(summary: &str) -> Vec<String> {
    let lower = summary.to_lowercase();
    Section::ALL
        .into_iter()
        .filter(|s| {
            !lower.contains(&s.title().to_lowercase())
                && !s.keywords().iter().any(|k| lower.contains(k))
        })
        .map(|s| s.title().to_string())
        .collect()
}

/// Body text under each known heading, indexed by `Section as usize`.
///
/// A heading is a line naming a section, optionally numbered (`2.`) or
/// marked up (`##`, `**`), followed by nothing, a colon, or a parenthetical.
/// Text on the heading line after a colon belongs to the body. A body runs
/// until the next known heading.
fn split_sections(summary: &str) -> [Option<String>; 4] {
    let mut bodies: [Option<Vec<&str>>; 4] = Default::default();
    let mut current: Option<Section> = None;

    for line in summary.lines() {
        if let Some((section, rest)) = parse_heading(line) {
            current = Some(section);
            let body = bodies[section as usize].get_or_insert_with(Vec::new);
            if !rest.is_empty() {
                body.push(rest);
            }
            continue;
        }
        if let Some(section) = current {
            let line = line.trim();
            if !line.is_empty() {
                bodies[section as usize].get_or_insert_with(Vec::new).push(line);
            }
        }
    }

    bodies.map(|b| b.map(|lines| lines.join("\n")))
}

fn parse_heading(line: &str) -> Option<(Section, &str)> {
    let stripped = line.trim().trim_start_matches(&['#', '*', ' '][..]);
    let unnumbered = stripped
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .strip_prefix('.')
        .map(str::trim_start);
    let numbered = unnumbered.is_some() && stripped.starts_with(|c: char| c.is_ascii_digit());
    let candidate = if numbered { unnumbered? } else { stripped };

    Section::ALL.into_iter().find_map(|section| {
        let title = section.title();
        let head = candidate.get(..title.len())?;
        if !head.eq_ignore_ascii_case(title) {
            return None;
        }
        let rest = candidate[title.len()..].trim_start_matches('*').trim();
        if rest.is_empty() {
            Some((section, rest))
        } else if rest.starts_with('(') {
            let after = rest.find(')').map(|i| &rest[i + 1..]).unwrap_or_default();
            Some((section, after.trim_start_matches(':').trim()))
        } else if let Some(after) = rest.strip_prefix(':') {
            Some((section, after.trim_start_matches('*').trim()))
        } else {
            None
        }
    })
}

fn non_empty(text: String) -> Result<String, ProviderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with("Error:") {
        Err(ProviderError::InvalidResponse(format!(
            "unusable model output: {:?}",
            trimmed
        )))
    } else {
        Ok(trimmed.to_string())
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
