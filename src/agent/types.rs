// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent types and configuration.

use std::sync::Arc;

use async_trait::async_trait;

use crate::mcp::{JsonObject, ToolInvoker};
use crate::types::BoxedProvider;

/// Callbacks for agent events.
///
/// Uses `Arc` instead of `Box` so callbacks can be cloned into streaming
/// closures without lifetime issues.
#[derive(Clone, Default)]
pub struct AgentCallbacks {
    /// Called when the model outputs text (streaming deltas).
    pub on_text: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    /// Called with each reply shown to the user as the assistant's answer.
    pub on_reply: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    /// Called before a tool runs (tool_name, arguments).
    pub on_tool_call: Option<Arc<dyn Fn(&str, &JsonObject) + Send + Sync>>,
    /// Called when a tool finishes (tool_name, output or error text, is_error).
    pub on_tool_result: Option<Arc<dyn Fn(&str, &str, bool) + Send + Sync>>,
    /// Called when a turn is abandoned.
    pub on_error: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl std::fmt::Debug for AgentCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCallbacks")
            .field("on_text", &self.on_text.is_some())
            .field("on_reply", &self.on_reply.is_some())
            .field("on_tool_call", &self.on_tool_call.is_some())
            .field("on_tool_result", &self.on_tool_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Tool calls allowed per user turn. Values below 1 are treated as 1.
    pub max_tool_calls: usize,
    /// Inputs that end the chat, compared case-insensitively.
    pub exit_keywords: Vec<String>,
    /// Stream model output through `on_text`.
    pub stream: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: 2,
            exit_keywords: vec!["exit".to_string(), "quit".to_string()],
            stream: true,
        }
    }
}

impl AgentConfig {
    pub fn tool_call_limit(&self) -> usize {
        self.max_tool_calls.max(1)
    }

    pub fn is_exit(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_keywords.iter().any(|k| k.eq_ignore_ascii_case(input))
    }
}

/// Options for creating an agent.
pub struct AgentOptions {
    /// LLM provider to use.
    pub provider: BoxedProvider,
    /// Tool surface.
    pub tools: Arc<dyn ToolInvoker>,
    /// System prompt. When `None` it is built from the tool list on first use.
    pub system_prompt: Option<String>,
    /// Agent configuration.
    pub config: AgentConfig,
    /// Event callbacks.
    pub callbacks: AgentCallbacks,
}

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered; `tool_calls` tools ran on the way.
    Reply { text: String, tool_calls: usize },
    /// The input was an exit keyword.
    Exit,
    /// The input was blank; nothing happened.
    Skipped,
}

/// Why [`crate::agent::Agent::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The user typed an exit keyword.
    Exit,
    /// The input source closed.
    EndOfInput,
    /// The cancel signal fired.
    Cancelled,
}

/// Where user lines come from. `None` means end of input.
#[async_trait]
pub trait InputSource: Send {
    async fn next_line(&mut self) -> Option<String>;
}

#[async_trait]
impl InputSource for std::collections::VecDeque<String> {
    async fn next_line(&mut self) -> Option<String> {
        self.pop_front()
    }
}
