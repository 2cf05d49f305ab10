// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core types shared by the agent loop and the LLM providers.
//!
//! The transcript is plain role-tagged text. Tool calls travel as text too:
//! the model writes a JSON intent and the agent feeds results back as
//! system messages, so any chat-completion endpoint can drive tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Ordered, append-only conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Replace the leading system prompt, or insert one.
    pub fn set_system(&mut self, prompt: impl Into<String>) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => first.content = prompt.into(),
            _ => self.messages.insert(0, Message::system(prompt)),
        }
    }

    /// Keep only the leading system prompt.
    pub fn clear(&mut self) {
        let keep = usize::from(self.messages.first().is_some_and(|m| m.role == Role::System));
        self.messages.truncate(keep);
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for an LLM provider instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the API endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model identifier to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Request timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ProviderConfig {
    /// Create a new provider config with API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

// ============================================================================
// Streaming Types
// ============================================================================

/// Events emitted during streaming responses.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of text content.
    TextDelta(String),

    /// Stream completed.
    Done,
}

impl StreamEvent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::TextDelta(text) => Some(text),
            Self::Done => None,
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Callback receiving stream events.
pub type StreamCallback = Box<dyn Fn(StreamEvent) + Send + Sync>;

/// An LLM chat endpoint: send a transcript, get text back.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and return the full reply.
    async fn send(&self, messages: &[Message]) -> Result<String, ProviderError>;

    /// Send the conversation, reporting text as it arrives.
    ///
    /// Returns the full reply. The default calls [`Provider::send`] and
    /// emits it as a single delta.
    async fn send_streaming(
        &self,
        messages: &[Message],
        on_event: StreamCallback,
    ) -> Result<String, ProviderError> {
        let text = self.send(messages).await?;
        on_event(StreamEvent::TextDelta(text.clone()));
        on_event(StreamEvent::Done);
        Ok(text)
    }

    /// Get the name of this provider for display purposes.
    fn name(&self) -> &str;

    /// Get the current model being used.
    fn model(&self) -> &str;
}

/// A boxed provider for dynamic dispatch.
pub type BoxedProvider = Box<dyn Provider>;

/// Arc-wrapped provider for shared ownership.
pub type SharedProvider = std::sync::Arc<dyn Provider>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert_eq!(Message::system("x").role.to_string(), "system");
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::assistant("Hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Hi"}"#);
    }

    #[test]
    fn test_transcript_system_prompt() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("q"));
        transcript.set_system("first");
        assert_eq!(transcript.messages()[0], Message::system("first"));

        transcript.set_system("second");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content, "second");

        transcript.clear();
        assert_eq!(transcript.messages(), &[Message::system("second")]);
    }

    struct Fixed;

    #[async_trait]
    impl Provider for Fixed {
        async fn send(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            Ok("answer".to_string())
        }
        fn name(&self) -> &str {
            "fixed"
        }
        fn model(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn test_default_streaming_emits_whole_reply() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reply = Fixed
            .send_streaming(&[], Box::new(move |e| sink.lock().unwrap().push(e)))
            .await
            .unwrap();

        assert_eq!(reply, "answer");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![StreamEvent::TextDelta("answer".into()), StreamEvent::Done]
        );
    }
}
