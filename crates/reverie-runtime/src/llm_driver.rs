//! [`LlmDriver`] – OpenAI-compatible [`Reasoner`] over blocking HTTP.
//!
//! Talks to any server exposing `/v1/chat/completions` and `/v1/embeddings`
//! in the OpenAI shape (OpenAI itself, Ollama, vLLM, LM Studio, …). Every call
//! blocks the caller until the server answers; no retries are attempted and
//! the only deadline is the client timeout set at construction.
//!
//! # Example
//!
//! ```rust,no_run
//! use reverie_runtime::llm_driver::LlmDriver;
//! use reverie_types::{ChatMessage, Reasoner};
//!
//! let driver = LlmDriver::new("http://localhost:11434");
//! let messages = [ChatMessage::user("Summarise my day.")];
//!
//! // Requires a running server – skipped in unit tests.
//! // let reply = driver.complete("llama3", &messages, 1.0).unwrap();
//! ```

use std::time::Duration;

use reverie_types::{ChatMessage, Reasoner, ReasonerError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ReverieConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from LLM driver operations.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The HTTP request to the model server failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The response from the model server could not be used.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
}

impl From<LlmError> for ReasonerError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(e) => ReasonerError::Transport(e.to_string()),
            LlmError::BadResponse(msg) => ReasonerError::BadResponse(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

/// Assistant reply; the role is not needed and may be `"assistant"`.
#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::BadResponse("empty choices array".into()))?
            .message
            .content
            .ok_or_else(|| LlmError::BadResponse("choice has no content".into()))
    }
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>, LlmError> {
        self.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::BadResponse("empty data array".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LlmDriver
// ─────────────────────────────────────────────────────────────────────────────

/// A blocking client for an OpenAI-compatible completion and embedding API.
///
/// Construct once and share through an `Arc` between the store and the
/// reflector.
pub struct LlmDriver {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl LlmDriver {
    /// Create a driver for `base_url` (e.g. `"https://api.openai.com"`) with
    /// reqwest's default client settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Send `api_key` as a bearer token on every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Build a driver from the endpoint, key and timeout in `config`.
    pub fn from_config(config: &ReverieConfig) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let driver = Self {
            client,
            ..Self::new(&config.base_url)
        };
        Ok(driver.with_api_key(&config.api_key))
    }

    /// Run one chat completion and return the first choice's text.
    pub fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model,
            messages,
            temperature,
            stream: false,
        };
        let response: ChatResponse = self.post("/v1/chat/completions", &body)?;
        response.into_text()
    }

    /// Embed `text` and return the first vector.
    pub fn embedding(&self, model: &str, text: &str) -> Result<Vec<f32>, LlmError> {
        let body = EmbeddingRequest {
            model,
            input: [text],
        };
        let response: EmbeddingResponse = self.post("/v1/embeddings", &body)?;
        response.into_vector()
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "posting to model server");
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Ok(request.send()?.error_for_status()?.json()?)
    }
}

impl Reasoner for LlmDriver {
    fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ReasonerError> {
        Ok(self.chat(model, messages, temperature)?)
    }

    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ReasonerError> {
        Ok(self.embedding(model, text)?)
    }
}
