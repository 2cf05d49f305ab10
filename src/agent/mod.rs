// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent module - tool-calling chat orchestration.
//!
//! The agent drives the conversation between the user, the model and the
//! MCP tools: send transcript -> parse reply -> run the requested tool ->
//! feed the result back -> repeat, up to a configured number of tool calls
//! per user turn.
//!
//! Transcript layout for one turn with a tool call:
//!
//! ```text
//! user       what's the weather in NY?
//! assistant  {"tool": "get_forecast", "arguments": {"city": "NY"}}
//! system     Tool execution result: 21C, clear
//! assistant  It's 21C and clear in New York.
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use mcpsh::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions};
//! use mcpsh::mcp::McpToolAdapter;
//!
//! let mut agent = Agent::new(AgentOptions {
//!     provider,
//!     tools: Arc::new(McpToolAdapter::new(manager)),
//!     system_prompt: None,
//!     config: AgentConfig::default(),
//!     callbacks: AgentCallbacks::default(),
//! });
//!
//! let outcome = agent.chat("What's the weather in NY?").await?;
//! ```

pub mod prompt;
pub mod translator;
mod types;

pub use prompt::build_system_prompt;
pub use translator::{parse_reply, ModelReply, ToolIntent};
pub use types::{
    AgentCallbacks, AgentConfig, AgentOptions, InputSource, RunEnd, TurnOutcome,
};

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::mcp::{ToolInvoker, ToolOutput};
use crate::types::{BoxedProvider, Message, StreamEvent, Transcript};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// The Agent orchestrates the conversation between the user, model, and tools.
pub struct Agent {
    /// LLM provider.
    provider: BoxedProvider,
    /// Tool surface.
    tools: Arc<dyn ToolInvoker>,
    /// Fixed system prompt; when `None` it is rebuilt from the tool list.
    system_prompt: Option<String>,
    /// Configuration.
    config: AgentConfig,
    /// Event callbacks.
    callbacks: AgentCallbacks,
    /// Conversation history.
    transcript: Transcript,
}

impl Agent {
    /// Create a new agent with the given options.
    pub fn new(options: AgentOptions) -> Self {
        let transcript = options
            .system_prompt
            .as_ref()
            .map(Transcript::with_system)
            .unwrap_or_default();

        Self {
            provider: options.provider,
            tools: options.tools,
            system_prompt: options.system_prompt,
            config: options.config,
            callbacks: options.callbacks,
            transcript,
        }
    }

    /// Get the conversation transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Get the current conversation messages.
    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Clear the conversation history, keeping the system prompt.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Rebuild the system prompt from the currently available tools.
    ///
    /// A prompt supplied through [`AgentOptions::system_prompt`] is kept as is.
    pub async fn refresh_system_prompt(&mut self) {
        let prompt = match &self.system_prompt {
            Some(prompt) => prompt.clone(),
            None => {
                let tools = self.tools.list_available_tools().await;
                build_system_prompt(tools.iter().map(|(_, tool)| tool))
            }
        };
        self.transcript.set_system(prompt);
    }

    /// Run one user turn without cancellation.
    pub async fn chat(&mut self, input: &str) -> Result<TurnOutcome, AgentError> {
        self.chat_internal(input, None).await
    }

    /// Run one user turn.
    ///
    /// If `cancel_rx` flips to `true` while the model is thinking or a tool is
    /// running, the turn stops with [`AgentError::UserCancelled`]. Messages
    /// appended before that point stay in the transcript.
    pub async fn chat_with_cancel(
        &mut self,
        input: &str,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<TurnOutcome, AgentError> {
        self.chat_internal(input, Some(cancel_rx)).await
    }

    async fn chat_internal(
        &mut self,
        input: &str,
        mut cancel_rx: Option<watch::Receiver<bool>>,
    ) -> Result<TurnOutcome, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }
        if self.config.is_exit(input) {
            return Ok(TurnOutcome::Exit);
        }
        if self.transcript.is_empty() {
            self.refresh_system_prompt().await;
        }

        let start_time = Instant::now();
        self.transcript.push(Message::user(input));

        let limit = self.config.tool_call_limit();
        let mut tool_calls = 0;

        let outcome = loop {
            let reply = self.request(&mut cancel_rx).await?;

            let intent = match parse_reply(&reply) {
                ModelReply::ToolCall(intent) if tool_calls < limit => intent,
                ModelReply::ToolCall(intent) => {
                    warn!(tool = %intent.tool, limit, "Tool call limit reached; returning reply as is");
                    break self.finish(reply, tool_calls);
                }
                ModelReply::Text(_) => break self.finish(reply, tool_calls),
            };

            // Shown before anything runs.
            if let Some(ref on_tool_call) = self.callbacks.on_tool_call {
                on_tool_call(&intent.tool, &intent.arguments);
            }
            self.transcript.push(Message::assistant(reply));
            tool_calls += 1;

            let result = match cancel_rx.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        res = self.tools.invoke(&intent.tool, intent.arguments) => res,
                        _ = cancelled(rx) => return Err(AgentError::UserCancelled),
                    }
                }
                None => self.tools.invoke(&intent.tool, intent.arguments).await,
            };
            self.record_tool_result(&intent.tool, result);
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("agent.turn", start_time.elapsed());

        debug!(
            tool_calls,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Turn complete"
        );
        Ok(outcome)
    }

    /// Append the final reply and report it.
    fn finish(&mut self, reply: String, tool_calls: usize) -> TurnOutcome {
        if let Some(ref on_reply) = self.callbacks.on_reply {
            on_reply(&reply);
        }
        self.transcript.push(Message::assistant(reply.clone()));
        TurnOutcome::Reply {
            text: reply,
            tool_calls,
        }
    }

    /// Append a tool result or failure as a system message.
    fn record_tool_result(&mut self, tool: &str, result: Result<ToolOutput, crate::mcp::McpError>) {
        let (text, is_error) = match result {
            Ok(output) if !output.is_error => (output.as_text(), false),
            Ok(output) => (output.as_text(), true),
            Err(e) => (e.to_string(), true),
        };

        if is_error {
            info!(tool, error = %text, "Tool execution failed");
            self.transcript
                .push(Message::system(format!("Error executing tool: {}", text)));
        } else {
            self.transcript
                .push(Message::system(format!("Tool execution result: {}", text)));
        }

        if let Some(ref on_tool_result) = self.callbacks.on_tool_result {
            on_tool_result(tool, &text, is_error);
        }
    }

    /// Send the transcript to the model. The transcript is not modified.
    async fn request(
        &self,
        cancel_rx: &mut Option<watch::Receiver<bool>>,
    ) -> Result<String, AgentError> {
        match cancel_rx.as_mut() {
            Some(rx) => {
                if *rx.borrow() {
                    return Err(AgentError::UserCancelled);
                }
                tokio::select! {
                    res = self.send() => res,
                    _ = cancelled(rx) => Err(AgentError::UserCancelled),
                }
            }
            None => self.send().await,
        }
    }

    async fn send(&self) -> Result<String, AgentError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let messages = self.transcript.messages();
        let result = if self.config.stream {
            let on_text = self.callbacks.on_text.clone();
            self.provider
                .send_streaming(
                    messages,
                    Box::new(move |event| {
                        if let StreamEvent::TextDelta(ref text) = event {
                            if let Some(ref cb) = on_text {
                                cb(text);
                            }
                        }
                    }),
                )
                .await
        } else {
            self.provider.send(messages).await
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("llm.send", start.elapsed());

        Ok(result?)
    }

    /// Drive the chat until exit, end of input, or cancellation.
    ///
    /// Model failures are reported through `on_error` and abandon only the
    /// current turn.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> RunEnd {
        self.refresh_system_prompt().await;

        loop {
            if *cancel_rx.borrow() {
                return RunEnd::Cancelled;
            }
            let line = tokio::select! {
                line = input.next_line() => line,
                _ = cancelled(&mut cancel_rx) => return RunEnd::Cancelled,
            };
            let Some(line) = line else {
                return RunEnd::EndOfInput;
            };

            match self.chat_with_cancel(&line, cancel_rx.clone()).await {
                Ok(TurnOutcome::Exit) => return RunEnd::Exit,
                Ok(_) => {}
                Err(AgentError::UserCancelled) => return RunEnd::Cancelled,
                Err(e) => {
                    warn!(error = %e, "Turn abandoned");
                    if let Some(ref on_error) = self.callbacks.on_error {
                        on_error(&e.to_string());
                    }
                }
            }
        }
    }
}

/// Resolve once the cancel flag is set. Never resolves if the sender is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
