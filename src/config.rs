//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working configuration that talks to OpenRouter with the models the
//! service was tuned on. Model names can additionally be overridden through
//! `SUMMARIZATION_MODEL`, `TRANSLATION_MODEL`, `QA_MODEL` and
//! `EMBEDDING_MODEL`.
//!
//! ```toml
//! [llm]
//! provider = "openrouter"        # or "disabled" for keyword-only answers
//! base_url = "https://openrouter.ai/api/v1"
//! api_key_env = "OPENROUTER_API_KEY"
//!
//! [chunking]
//! qa_max_chars = 2000
//! qa_overlap_chars = 300
//!
//! [retrieval]
//! high_threshold = 0.5
//! low_threshold = 0.3
//! ```

use anyhow::{bail, Context, Result};
use sahayak_core::chunk::ChunkParams;
use sahayak_core::fallback::PreviewLimits;
use sahayak_core::qa::QaSettings;
use sahayak_core::retrieve::Thresholds;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_summarization_model")]
    pub summarization_model: String,
    #[serde(default = "default_translation_model")]
    pub translation_model: String,
    #[serde(default = "default_qa_model")]
    pub qa_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_embed_retry_delay_secs")]
    pub embed_retry_delay_secs: u64,
    #[serde(default = "default_generate_retry_delay_secs")]
    pub generate_retry_delay_secs: u64,
    /// Longer embedding inputs are truncated before sending.
    #[serde(default = "default_max_embed_input_chars")]
    pub max_embed_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            summarization_model: default_summarization_model(),
            translation_model: default_translation_model(),
            qa_model: default_qa_model(),
            embedding_model: default_embedding_model(),
            embedding_dims: default_embedding_dims(),
            timeout_secs: default_timeout_secs(),
            embed_retry_delay_secs: default_embed_retry_delay_secs(),
            generate_retry_delay_secs: default_generate_retry_delay_secs(),
            max_embed_input_chars: default_max_embed_input_chars(),
        }
    }
}

fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}
fn default_summarization_model() -> String {
    "mistralai/mistral-small-3.2-24b-instruct".to_string()
}
fn default_translation_model() -> String {
    "google/gemma-3-27b-instruct".to_string()
}
fn default_qa_model() -> String {
    "mistralai/mistral-small-3.2-24b-instruct".to_string()
}
fn default_embedding_model() -> String {
    "openai/text-embedding-3-small".to_string()
}
fn default_embedding_dims() -> usize {
    1536
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_embed_retry_delay_secs() -> u64 {
    10
}
fn default_generate_retry_delay_secs() -> u64 {
    5
}
fn default_max_embed_input_chars() -> usize {
    8000
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn embed_retry_delay(&self) -> Duration {
        Duration::from_secs(self.embed_retry_delay_secs)
    }

    pub fn generate_retry_delay(&self) -> Duration {
        Duration::from_secs(self.generate_retry_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_qa_max_chars")]
    pub qa_max_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub qa_overlap_chars: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub summary_overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            qa_max_chars: default_qa_max_chars(),
            qa_overlap_chars: default_overlap_chars(),
            summary_max_chars: default_summary_max_chars(),
            summary_overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_qa_max_chars() -> usize {
    2000
}
fn default_summary_max_chars() -> usize {
    3000
}
fn default_overlap_chars() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            low_threshold: default_low_threshold(),
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_high_threshold() -> f32 {
    0.5
}
fn default_low_threshold() -> f32 {
    0.3
}
fn default_top_k() -> usize {
    3
}
fn default_max_context_chars() -> usize {
    6000
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default = "default_category_preview_chars")]
    pub category_preview_chars: usize,
    #[serde(default = "default_keyword_preview_chars")]
    pub keyword_preview_chars: usize,
    #[serde(default = "default_match_preview_chars")]
    pub match_preview_chars: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            category_preview_chars: default_category_preview_chars(),
            keyword_preview_chars: default_keyword_preview_chars(),
            match_preview_chars: default_match_preview_chars(),
        }
    }
}

fn default_category_preview_chars() -> usize {
    500
}
fn default_keyword_preview_chars() -> usize {
    400
}
fn default_match_preview_chars() -> usize {
    300
}

impl Config {
    pub fn qa_chunking(&self) -> Result<ChunkParams> {
        ChunkParams::new(self.chunking.qa_max_chars, self.chunking.qa_overlap_chars)
            .context("invalid [chunking] qa window")
    }

    pub fn summary_chunking(&self) -> Result<ChunkParams> {
        ChunkParams::new(
            self.chunking.summary_max_chars,
            self.chunking.summary_overlap_chars,
        )
        .context("invalid [chunking] summary window")
    }

    pub fn qa_settings(&self) -> Result<QaSettings> {
        Ok(QaSettings {
            chunking: self.qa_chunking()?,
            thresholds: Thresholds {
                high: self.retrieval.high_threshold,
                low: self.retrieval.low_threshold,
            },
            top_k: self.retrieval.top_k,
            max_context_chars: self.retrieval.max_context_chars,
            previews: PreviewLimits {
                category_chars: self.fallback.category_preview_chars,
                keyword_chars: self.fallback.keyword_preview_chars,
                match_chars: self.fallback.match_preview_chars,
            },
        })
    }

    /// Apply `*_MODEL` environment overrides.
    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 4] = [
            ("SUMMARIZATION_MODEL", &mut self.llm.summarization_model),
            ("TRANSLATION_MODEL", &mut self.llm.translation_model),
            ("QA_MODEL", &mut self.llm.qa_model),
            ("EMBEDDING_MODEL", &mut self.llm.embedding_model),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    *slot = value.trim().to_string();
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.qa_chunking()?;
        self.summary_chunking()?;

        let r = &self.retrieval;
        if !(0.0..=1.0).contains(&r.low_threshold) || !(0.0..=1.0).contains(&r.high_threshold) {
            bail!("retrieval thresholds must be in [0.0, 1.0]");
        }
        if r.low_threshold > r.high_threshold {
            bail!(
                "retrieval.low_threshold ({}) must not exceed retrieval.high_threshold ({})",
                r.low_threshold,
                r.high_threshold
            );
        }
        if r.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if r.max_context_chars == 0 {
            bail!("retrieval.max_context_chars must be > 0");
        }

        if self.llm.embedding_dims == 0 {
            bail!("llm.embedding_dims must be > 0");
        }
        if self.llm.max_embed_input_chars == 0 {
            bail!("llm.max_embed_input_chars must be > 0");
        }

        match self.llm.provider.as_str() {
            "disabled" | "openrouter" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be openrouter or disabled.",
                other
            ),
        }

        Ok(())
    }
}

/// Load and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    finish(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("no config at {}, using defaults", path.display());
        finish(Config::default())
    }
}

fn finish(mut config: Config) -> Result<Config> {
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let f = write_config("");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.llm.provider, "openrouter");
        assert_eq!(cfg.llm.embedding_dims, 1536);
        assert_eq!(cfg.chunking.qa_max_chars, 2000);
        assert_eq!(cfg.chunking.summary_max_chars, 3000);
        assert_eq!(cfg.retrieval.top_k, 3);

        let qa = cfg.qa_settings().unwrap();
        assert_eq!(qa.thresholds.high, 0.5);
        assert_eq!(qa.thresholds.low, 0.3);
        assert_eq!(qa.max_context_chars, 6000);
        assert_eq!(qa.previews.category_chars, 500);
        assert_eq!(qa.previews.keyword_chars, 400);
    }

    #[test]
    fn test_partial_sections() {
        let f = write_config(
            r#"
[llm]
provider = "disabled"

[retrieval]
high_threshold = 0.6
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert!(!cfg.llm.is_enabled());
        assert_eq!(cfg.retrieval.high_threshold, 0.6);
        assert_eq!(cfg.retrieval.low_threshold, 0.3);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_window() {
        let f = write_config("[chunking]\nqa_max_chars = 300\nqa_overlap_chars = 300\n");
        let err = load_config(f.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("overlap"));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let f = write_config("[retrieval]\nhigh_threshold = 0.2\nlow_threshold = 0.4\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let f = write_config("[llm]\nprovider = \"carrier-pigeon\"\n");
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.retrieval.max_context_chars, 6000);
        assert!(load_config(&dir.path().join("nope.toml")).is_err());
    }
}
