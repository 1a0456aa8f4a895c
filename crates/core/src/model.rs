//! Chat model access.
//!
//! The pipeline only needs "prompt in, text out", expressed by [`ChatModel`].
//! [`OllamaClient`] implements it against a local Ollama server.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ChartwiseError, Result};

/// A chat-style model that answers one user message with text.
pub trait ChatModel {
    /// Sends `prompt` as a single user-role message and returns the reply text.
    fn chat(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Connection settings for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the server.
    pub endpoint: String,
    /// Model name, e.g. `mistral`.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { endpoint: "http://localhost:11434".to_string(), model: "mistral".to_string(), timeout: 120 }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

/// Client for the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    chat_url: Url,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let mut base = Url::parse(&config.endpoint).map_err(|e| ChartwiseError::InvalidUrl(e.to_string()))?;
        // Keep a path prefix such as a reverse-proxy mount.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let chat_url = base.join("api/chat").map_err(|e| ChartwiseError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(ChartwiseError::HttpError)?;

        Ok(Self { client, chat_url, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }
}

impl ChatModel for OllamaClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            stream: false,
        };

        tracing::debug!(model = %self.config.model, url = %self.chat_url, "sending chat request");

        let response = self.client.post(self.chat_url.clone()).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                ChartwiseError::Timeout { timeout: self.config.timeout }
            } else {
                ChartwiseError::HttpError(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChartwiseError::ModelStatus { status: status.as_u16(), body: body.trim().to_string() });
        }

        let body: ChatResponse = response.json().await?;
        reply_text(body)
    }
}

fn reply_text(body: ChatResponse) -> Result<String> {
    if let Some(error) = body.error {
        return Err(ChartwiseError::ModelError(error));
    }

    match body.message {
        Some(message) if !message.content.trim().is_empty() => Ok(message.content),
        _ => Err(ChartwiseError::ModelError("empty response from model".to_string())),
    }
}
