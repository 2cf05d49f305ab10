// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! mcpsh - an interactive console for Model Context Protocol servers.
//!
//! Connects to any number of MCP tool servers over stdio or HTTP, lets you
//! browse and call their tools, resources and prompts, and runs a chat loop
//! in which an LLM can call those tools through a plain-text JSON protocol.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Transcript messages and the LLM provider trait
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading, merging and persistence
//! - [`providers`] - OpenAI-compatible chat-completions clients
//! - [`telemetry`] - Tracing setup and in-process metrics
//! - [`mcp`] - Server sessions, the capability registry and the server manager
//! - [`agent`] - Tool-call translation and the chat orchestration loop
//! - [`console`] - The interactive command console
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mcpsh::agent::{Agent, AgentOptions};
//! use mcpsh::mcp::{McpToolAdapter, RmcpConnector, ServerDescriptor, ServerManager};
//!
//! let manager = Arc::new(ServerManager::with_servers(
//!     Arc::new(RmcpConnector),
//!     [ServerDescriptor::stdio("files", "mcp-server-filesystem").with_args(["/tmp"])],
//! ));
//! manager.connect_enabled().await;
//!
//! let mut agent = Agent::new(AgentOptions {
//!     provider: mcpsh::providers::create_provider_from_config(&config.llm)?,
//!     tools: Arc::new(McpToolAdapter::new(manager)),
//!     system_prompt: None,
//!     config: Default::default(),
//!     callbacks: Default::default(),
//! });
//! let outcome = agent.chat("What is in /tmp?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod console;
pub mod error;
pub mod mcp;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AgentError, ConfigError, ProviderError, Result};
pub use mcp::McpError;
pub use providers::{create_provider, create_provider_from_config, OpenAIProvider, ProviderType};
pub use types::{BoxedProvider, Message, Provider, ProviderConfig, Role, SharedProvider, StreamEvent, Transcript};

/// mcpsh version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
