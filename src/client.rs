//! Rotating-key LLM client with retry, backoff, and model fallback.
//!
//! This module provides a resilient interface to a Gemini-style text
//! generation API. A pool of API keys is rotated on every attempt, the
//! successful ones included, to spread load across keys and stay under
//! per-key rate limits.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`TextGenerator`]: Core trait defining a single generation attempt
//! - [`HttpGenerator`]: The reqwest-backed implementation of the real API
//! - [`RotatingClient`]: Decorator that adds key rotation, retry, backoff,
//!   and fallback-model logic to any `TextGenerator`
//!
//! # Retry Strategy
//!
//! - Up to `max_retries` attempts per model tier
//! - Rate limits (HTTP 429) back off exponentially: `2^attempt * 2s`
//! - Every other outcome, success included, waits a fixed 2 s cool-down
//! - After the primary tier is exhausted, the fallback tier gets a fresh
//!   retry budget before the whole request fails

use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Default endpoint for the generation API.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Budget for a single generation call. Long-form article generation can
/// legitimately take minutes.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Hard failures surfaced to the orchestrator.
#[derive(Debug, Error)]
pub enum GenError {
    /// The credential pool is empty; no request can be made.
    #[error("no API keys available; add at least one key")]
    NoCredentials,
    /// Every attempt on every model tier failed.
    #[error("failed to get a response after {attempts} attempts with model {model}")]
    ExhaustedRetries {
        /// The last model tier tried.
        model: String,
        /// Attempts spent on that tier.
        attempts: usize,
    },
}

/// Per-attempt failures, contained inside the retry loop.
#[derive(Debug, Error)]
pub enum RequestError {
    /// HTTP 429; triggers exponential backoff instead of the fixed cool-down.
    #[error("rate limited (429)")]
    RateLimited,
    /// Any other non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    /// Structurally valid response with no usable candidate text.
    #[error("response contained no candidates")]
    EmptyResponse,
    /// Network or protocol failure below HTTP.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// An ordered pool of API keys with a wrapping rotation pointer.
///
/// The pointer is mutated on every request attempt, so a pool (and the
/// client owning it) must not be shared between concurrently generated
/// articles without external serialization.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    current: usize,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, current: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current position of the rotation pointer.
    pub fn position(&self) -> usize {
        self.current
    }

    /// The key the next attempt will use.
    pub fn current(&self) -> Result<&str, GenError> {
        self.keys
            .get(self.current)
            .map(String::as_str)
            .ok_or(GenError::NoCredentials)
    }

    /// Advance the pointer to the next key, wrapping at the end of the pool.
    pub fn rotate(&mut self) -> Result<&str, GenError> {
        if self.keys.is_empty() {
            return Err(GenError::NoCredentials);
        }
        self.current = (self.current + 1) % self.keys.len();
        Ok(&self.keys[self.current])
    }
}

/// A single generation attempt against some backend.
///
/// Implementors perform exactly one request; all retry and rotation policy
/// lives in [`RotatingClient`].
#[async_trait]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str, model: &str, key: &str)
    -> Result<String, RequestError>;
}

/// Retry and fallback configuration for [`RotatingClient`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per model tier.
    pub max_retries: usize,
    /// Fixed wait applied after success, transport errors, and empty bodies.
    pub cooldown: Duration,
    /// Base for the 429 backoff: `backoff_base * 2^attempt`.
    pub backoff_base: Duration,
    /// The model tier that is allowed to fall back.
    pub primary_model: String,
    /// Tier tried with a fresh budget once the primary is exhausted.
    pub fallback_model: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            cooldown: Duration::from_secs(2),
            backoff_base: Duration::from_secs(2),
            primary_model: "gemini-1.5-pro".to_string(),
            fallback_model: Some("gemini-1.5-flash".to_string()),
        }
    }
}

impl RetryPolicy {
    /// The tier to retry on after `model` is exhausted, if any.
    fn fallback_for(&self, model: &str) -> Option<&str> {
        match &self.fallback_model {
            Some(fb) if model == self.primary_model && fb != model => Some(fb),
            _ => None,
        }
    }
}

/// Decorator adding key rotation, retry, backoff, and model fallback to a
/// [`TextGenerator`].
#[derive(Debug)]
pub struct RotatingClient<T> {
    transport: T,
    pool: KeyPool,
    policy: RetryPolicy,
}

impl<T> RotatingClient<T>
where
    T: TextGenerator,
{
    pub fn new(transport: T, keys: Vec<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            pool: KeyPool::new(keys),
            policy,
        }
    }

    /// Rotation pointer position, exposed for inspection.
    pub fn key_position(&self) -> usize {
        self.pool.position()
    }

    /// Send a prompt, retrying across keys and falling back across model
    /// tiers until text is produced or everything is exhausted.
    #[instrument(level = "info", skip_all, fields(model = %model))]
    pub async fn send(&mut self, prompt: &str, model: &str) -> Result<String, GenError> {
        debug!(key_position = self.key_position(), "starting request");
        let mut tier = model.to_string();
        loop {
            match self.send_tier(prompt, &tier).await {
                Ok(text) => return Ok(text),
                Err(GenError::ExhaustedRetries { .. }) => {
                    if let Some(fb) = self.policy.fallback_for(&tier) {
                        warn!(from = %tier, to = %fb, "model tier exhausted; falling back");
                        tier = fb.to_string();
                        continue;
                    }
                    return Err(GenError::ExhaustedRetries {
                        model: tier,
                        attempts: self.policy.max_retries,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the retry loop for one model tier.
    async fn send_tier(&mut self, prompt: &str, model: &str) -> Result<String, GenError> {
        if self.pool.is_empty() {
            return Err(GenError::NoCredentials);
        }

        let mut retry = 0usize;
        while retry < self.policy.max_retries {
            let key = self.pool.current()?.to_string();
            match self.transport.generate(prompt, model, &key).await {
                Ok(text) => {
                    // Rotation and cool-down happen on success too, spreading
                    // load across keys between consecutive requests.
                    self.pool.rotate()?;
                    sleep(self.policy.cooldown).await;
                    info!(
                        bytes = text.len(),
                        preview = %truncate_for_log(&text, 120),
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Err(RequestError::RateLimited) => {
                    self.pool.rotate()?;
                    let delay = self.policy.backoff_base.saturating_mul(1 << retry);
                    warn!(attempt = retry, ?delay, "rate limited; backing off");
                    sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    self.pool.rotate()?;
                    warn!(attempt = retry, error = %e, "attempt failed; rotating key");
                    sleep(self.policy.cooldown).await;
                    retry += 1;
                }
            }
        }

        Err(GenError::ExhaustedRetries {
            model: model.to_string(),
            attempts: self.policy.max_retries,
        })
    }
}

/// Reqwest-backed [`TextGenerator`] for the Gemini `generateContent` endpoint.
#[derive(Debug)]
pub struct HttpGenerator {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(GENERATION_TIMEOUT)
                .build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the generator at a different endpoint base.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    #[instrument(level = "debug", skip_all, fields(model = %model))]
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        key: &str,
    ) -> Result<String, RequestError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, key
        );
        let body = GenerationRequest::for_prompt(prompt);

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RequestError::RateLimited);
        }
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }

        let parsed: GenerationResponse = response.json().await?;
        parsed.first_text().ok_or(RequestError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

impl GenerationRequest {
    fn for_prompt(prompt: &str) -> Self {
        let categories = [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ];
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 8192,
                stop_sequences: vec![],
            },
            safety_settings: categories
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    stop_sequences: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerationResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
