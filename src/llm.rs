//! OpenRouter-backed embedding and generation providers.
//!
//! Both providers talk to an OpenAI-compatible API (`POST /embeddings`,
//! `POST /chat/completions`) and implement the traits from
//! [`sahayak_core::provider`].
//!
//! # Retry Strategy
//!
//! A rate-limited call is retried exactly once after a fixed delay
//! (10s for embeddings, 5s for generation by default). Every other failure
//! is returned immediately. Rate limiting is recognised by:
//! - HTTP 429
//! - an error body mentioning a rate limit
//! - a `200 OK` whose JSON carries `{"error": {"code": 429}}`, which
//!   OpenRouter uses for upstream throttling

use anyhow::{bail, Result};
use async_trait::async_trait;
use sahayak_core::chunk::truncate_chars;
use sahayak_core::provider::{
    EmbeddingProvider, GenerationProvider, GenerationRequest, ProviderError,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::LlmConfig;

/// The providers one session needs, one generator per task.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub summarizer: Arc<dyn GenerationProvider>,
    pub translator: Arc<dyn GenerationProvider>,
    pub answerer: Arc<dyn GenerationProvider>,
}

/// Build providers from configuration.
///
/// # Errors
///
/// Fails for the `openrouter` provider when the API key variable is unset,
/// or if the HTTP client can not be built.
pub fn create_providers(config: &LlmConfig) -> Result<Providers> {
    if !config.is_enabled() {
        return Ok(Providers {
            embedder: Arc::new(DisabledEmbedder {
                dims: config.embedding_dims,
            }),
            summarizer: Arc::new(DisabledGenerator),
            translator: Arc::new(DisabledGenerator),
            answerer: Arc::new(DisabledGenerator),
        });
    }
    if config.provider != "openrouter" {
        bail!("Unknown llm provider: {}", config.provider);
    }

    let api = OpenRouterApi::new(config)?;
    let generator = |model: &str| -> Arc<dyn GenerationProvider> {
        Arc::new(OpenRouterGenerator {
            api: api.clone(),
            model: model.to_string(),
            retry_delay: config.generate_retry_delay(),
        })
    };
    Ok(Providers {
        embedder: Arc::new(OpenRouterEmbedder {
            api: api.clone(),
            model: config.embedding_model.clone(),
            dims: config.embedding_dims,
            retry_delay: config.embed_retry_delay(),
            max_input_chars: config.max_embed_input_chars,
        }),
        summarizer: generator(&config.summarization_model),
        translator: generator(&config.translation_model),
        answerer: generator(&config.qa_model),
    })
}

// ============ Disabled Providers ============

/// Fails every call with [`ProviderError::Disabled`].
///
/// Lets the Q&A engine run on keyword matching alone when no API key is
/// available.
pub struct DisabledEmbedder {
    dims: usize,
}

#[async_trait]
impl EmbeddingProvider for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Disabled)
    }
}

pub struct DisabledGenerator;

#[async_trait]
impl GenerationProvider for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        Err(ProviderError::Disabled)
    }
}

// ============ OpenRouter ============

/// Shared HTTP client, endpoint and credentials.
#[derive(Clone)]
struct OpenRouterApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterApi {
    fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!(
                "{} environment variable not set (set [llm] provider = \"disabled\" to run without a model)",
                config.api_key_env
            ),
        };

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("X-Title", "Sahayak")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), body_text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match error_in_body(&json) {
            Some(err) => Err(err),
            None => Ok(json),
        }
    }
}

/// Embeddings via `POST {base_url}/embeddings`.
pub struct OpenRouterEmbedder {
    api: OpenRouterApi,
    model: String,
    dims: usize,
    retry_delay: Duration,
    max_input_chars: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenRouterEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let input = prepare_embedding_input(text, self.max_input_chars);
        let body = serde_json::json!({
            "model": self.model,
            "input": input,
        });
        let body = &body;

        let json = retry_on_rate_limit("embedding", self.retry_delay, || {
            self.api.post("embeddings", body)
        })
        .await?;

        let embedding = parse_embedding_response(&json)?;
        debug!(dims = embedding.len(), "embedding generated");
        Ok(embedding)
    }
}

/// Chat completions via `POST {base_url}/chat/completions`.
pub struct OpenRouterGenerator {
    api: OpenRouterApi,
    model: String,
    retry_delay: Duration,
}

#[async_trait]
impl GenerationProvider for OpenRouterGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = Value::from(max_tokens);
        }
        let body = &body;

        let json = retry_on_rate_limit(&self.model, self.retry_delay, || {
            self.api.post("chat/completions", body)
        })
        .await?;

        parse_completion_response(&json)
    }
}

/// Run `call`, and run it once more after `delay` if it was rate limited.
pub async fn retry_on_rate_limit<T, F, Fut>(
    label: &str,
    delay: Duration,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    match call().await {
        Err(e) if e.is_rate_limited() => {
            warn!("{}: rate limited, retrying in {:?}", label, delay);
            tokio::time::sleep(delay).await;
            call().await.map_err(|e| {
                error!("{}: retry failed: {}", label, e);
                e
            })
        }
        other => other,
    }
}

/// Trim and cap embedding input.
fn prepare_embedding_input(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim();
    let capped = truncate_chars(trimmed, max_chars);
    if capped.len() < trimmed.len() {
        debug!("text truncated to {} chars for embedding", max_chars);
    }
    capped
}

/// Map a non-success HTTP response to a [`ProviderError`].
fn classify_failure(status: u16, body: String) -> ProviderError {
    if status == 429 || body.to_lowercase().contains("rate limit") {
        ProviderError::RateLimited(format!("HTTP {}: {}", status, body))
    } else {
        ProviderError::Http { status, body }
    }
}

/// OpenRouter may report a failure inside a `200 OK` body.
fn error_in_body(json: &Value) -> Option<ProviderError> {
    let err = json.get("error")?;
    let message = err
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error")
        .to_string();
    let code = err.get("code").and_then(|c| c.as_u64()).unwrap_or(0);

    Some(match code {
        429 => ProviderError::RateLimited(message),
        400..=599 => classify_failure(code as u16, message),
        _ if message.to_lowercase().contains("rate limit") => ProviderError::RateLimited(message),
        _ => ProviderError::InvalidResponse(message),
    })
}

/// Extract `data[0].embedding`.
fn parse_embedding_response(json: &Value) -> Result<Vec<f32>, ProviderError> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing data[0].embedding".to_string())
        })?;

    if embedding.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "empty embedding".to_string(),
        ));
    }

    embedding
        .iter()
        .map(|v| {
            let value = v.as_f64().map(|f| f as f32).ok_or_else(|| {
                ProviderError::InvalidResponse("non-numeric embedding value".to_string())
            })?;
            if !value.is_finite() {
                return Err(ProviderError::InvalidResponse(
                    "embedding value out of range".to_string(),
                ));
            }
            Ok(value)
        })
        .collect()
}

/// Extract and trim `choices[0].message.content`.
fn parse_completion_response(json: &Value) -> Result<String, ProviderError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing choices[0].message.content".to_string())
        })
}
