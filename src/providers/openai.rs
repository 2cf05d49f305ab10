// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI-compatible provider implementation.
//!
//! This module provides a [`Provider`] implementation for OpenAI and any
//! OpenAI-compatible chat-completions API.
//!
//! # Supported Endpoints
//!
//! - **OpenAI** - `https://api.openai.com/v1` (default)
//! - **Ollama** - `http://localhost:11434/v1` (no API key needed)
//! - **DeepSeek** - `https://api.deepseek.com/v1`
//! - **OpenRouter** - `https://openrouter.ai/api/v1`
//!
//! # API Reference
//!
//! See [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{Message, Provider, ProviderConfig, StreamCallback, StreamEvent};

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Ollama API base URL.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_ms: u64,
    provider_name: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        config: ProviderConfig,
    ) -> Self {
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let provider_name = Self::detect_provider_name(&base_url);

        Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            base_url,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_ms: timeout.as_millis() as u64,
            provider_name,
        }
    }

    /// Create a provider for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(
            Some(api_key.into()),
            model,
            OPENAI_BASE_URL,
            ProviderConfig::default(),
        )
    }

    /// Create a provider for Ollama (no API key needed).
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(None, model, OLLAMA_BASE_URL, ProviderConfig::default())
    }

    /// Detect provider name from base URL.
    fn detect_provider_name(base_url: &str) -> String {
        if base_url.contains("openai.com") {
            "OpenAI".to_string()
        } else if base_url.contains("localhost:11434") || base_url.contains("ollama") {
            "Ollama".to_string()
        } else if base_url.contains("deepseek") {
            "DeepSeek".to_string()
        } else if base_url.contains("openrouter") {
            "OpenRouter".to_string()
        } else {
            "OpenAI-Compatible".to_string()
        }
    }

    /// Build the request body for the Chat Completions API.
    fn build_request(&self, messages: &[Message], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream,
        }
    }

    /// POST the request and map transport and HTTP errors.
    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, ProviderError> {
        debug!(
            provider = %self.provider_name,
            model = %self.model,
            messages = request.messages.len(),
            stream = request.stream,
            "Sending chat request"
        );

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.header("authorization", format!("Bearer {}", api_key));
        }

        let response = req.json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_ms)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(handle_error_response(status.as_u16(), &error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn send(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let request = self.build_request(messages, false);
        let response = self.post(&request).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))
    }

    async fn send_streaming(
        &self,
        messages: &[Message],
        on_event: StreamCallback,
    ) -> Result<String, ProviderError> {
        let request = self.build_request(messages, true);
        let mut response = self.post(&request).await?;

        let mut decoder = SseDecoder::default();
        let mut text = String::new();

        'stream: while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProviderError::StreamError(e.to_string()))?
        {
            for payload in decoder.push(&chunk) {
                match payload {
                    SsePayload::Done => break 'stream,
                    SsePayload::Data(data) => {
                        if let Some(delta) = content_delta(&data) {
                            text.push_str(&delta);
                            on_event(StreamEvent::TextDelta(delta));
                        }
                    }
                }
            }
        }

        on_event(StreamEvent::Done);
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map an error response body onto a provider error.
fn handle_error_response(status_code: u16, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ApiError>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .unwrap_or_else(|| body.to_string());
    let error_type = parsed.and_then(|e| e.error.error_type);

    match (status_code, error_type.as_deref()) {
        (401, _) | (_, Some("authentication_error" | "invalid_api_key")) => {
            ProviderError::AuthError(message)
        }
        (429, _) | (_, Some("rate_limit_error" | "rate_limit_exceeded")) => {
            ProviderError::RateLimited(message)
        }
        (404, _) | (_, Some("model_not_found")) => ProviderError::ModelNotFound(message),
        _ => ProviderError::api(message, status_code),
    }
}

/// Text delta from one streamed chunk, if any.
fn content_delta(data: &str) -> Option<String> {
    let chunk: ChatStreamChunk = serde_json::from_str(data).ok()?;
    let content: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    (!content.is_empty()).then_some(content)
}

/// One event-stream payload.
#[derive(Debug, PartialEq)]
enum SsePayload {
    Data(String),
    Done,
}

/// Incremental `data:` line splitter. Lines may straddle chunk boundaries.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<SsePayload> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if data.trim() == "[DONE]" {
                    out.push(SsePayload::Done);
                } else {
                    out.push(SsePayload::Data(data.to_string()));
                }
            }
        }
        out
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Request body for Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// Chat message format.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: Some(msg.content.clone()),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Streaming chunk.
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

/// Choice in streaming chunk.
#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatStreamDelta,
}

/// Delta in streaming.
#[derive(Debug, Default, Deserialize)]
struct ChatStreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
