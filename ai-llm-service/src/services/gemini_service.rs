//! Gemini service for non-streaming text generation.
//!
//! Minimal client around the `generateContent` REST method:
//! - POST {endpoint}/v1beta/models/{model}:generateContent?key={api_key}
//!
//! The prompt is sent as a single user turn with one text part. The first
//! candidate's first text part is returned; a response without candidates
//! yields an empty string rather than an error.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::gemini_config::{GeminiConfig, GenerationOptions},
    error_handler::{
        AiLlmError, ConfigError, HttpError, ProviderError, Result, make_snippet,
        validate_http_endpoint,
    },
};

/// Thin client for the Gemini API.
///
/// Constructed once from a [`GeminiConfig`] and shared via `Arc`; the inner
/// `reqwest::Client` is reused for every call.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: GeminiConfig,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Config`] if the endpoint is not http(s) or the model is empty
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: GeminiConfig) -> Result<Self> {
        validate_http_endpoint("GEMINI_ENDPOINT", cfg.endpoint.trim())?;
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let url_generate = cfg.generate_url();

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            has_key = cfg.has_api_key(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Whether requests will carry an API key.
    pub fn has_api_key(&self) -> bool {
        self.cfg.has_api_key()
    }

    /// Performs one **non-streaming** `generateContent` request.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    pub async fn generate(&self, prompt: &str, opts: GenerationOptions) -> Result<String> {
        let started = Instant::now();
        let body = GenerateContentRequest::new(prompt, opts);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            max_output_tokens = opts.max_output_tokens,
            "POST {}", self.url_generate
        );

        let mut req = self.client.post(&self.url_generate).json(&body);
        if let Some(key) = self.cfg.api_key.as_deref() {
            req = req.query(&[("key", key)]);
        }
        // The request URL carries the API key; strip it from transport errors.
        let resp = req.send().await.map_err(|e| {
            let e = e.without_url();
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "generateContent transport failure"
            );
            e
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Gemini generateContent returned non-success status"
            );

            return Err(ProviderError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        let out: GenerateContentResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                let e = e.without_url();
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode generateContent response"
                );
                return Err(AiLlmError::Provider(ProviderError::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[0].text`"
                ))));
            }
        };

        let text = out.first_text().unwrap_or_default();

        info!(
            model = %self.cfg.model,
            output_len = text.len(),
            latency_ms = started.elapsed().as_millis(),
            "generateContent completed"
        );

        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, opts: GenerationOptions) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: opts.temperature,
                max_output_tokens: opts.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// Minimal response for `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
