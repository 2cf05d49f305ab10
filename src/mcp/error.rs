// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP error types.
//!
//! The variants fall into four families that callers branch on:
//! connection setup, not-connected, not-found, and execution failures.
//! See [`McpError::is_not_found`] and friends.

use thiserror::Error;

/// Errors that can occur during MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Transport setup or handshake failed.
    #[error("Failed to connect to server {server}: {message}")]
    Connection { server: String, message: String },

    /// Operation attempted on a server that is not connected.
    #[error("Server {0} is not connected")]
    NotConnected(String),

    /// Server name is not registered with the manager.
    #[error("Server {0} not found")]
    ServerNotFound(String),

    /// Named server does not expose the tool.
    #[error("Server {server} does not have tool {tool}")]
    ToolNotFound { server: String, tool: String },

    /// No connected server exposes the tool.
    #[error("No connected server found with tool {0}")]
    NoServerWithTool(String),

    /// Named server does not expose the prompt.
    #[error("Server {server} does not have prompt {prompt}")]
    PromptNotFound { server: String, prompt: String },

    /// No connected server exposes the prompt.
    #[error("No connected server found with prompt {0}")]
    NoServerWithPrompt(String),

    /// A remote call raised an error.
    #[error("{operation} failed: {message}")]
    Execution { operation: String, message: String },

    /// A remote call did not finish in time.
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },

    /// Every connected server failed to serve the resource.
    #[error("Resource {uri} could not be read from any connected server: {message}")]
    ResourceUnavailable { uri: String, message: String },

    /// Request was rejected before any I/O.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A server with this name is already registered.
    #[error("Server {0} already exists")]
    DuplicateServer(String),

    /// The server does not offer an optional capability.
    #[error("Capability not supported: {0}")]
    Unsupported(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl McpError {
    /// Create a connection error.
    pub fn connection(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create an execution error for a named remote operation.
    pub fn execution(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }

    /// Named server, tool, or prompt does not exist in scope.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ServerNotFound(_)
                | Self::ToolNotFound { .. }
                | Self::NoServerWithTool(_)
                | Self::PromptNotFound { .. }
                | Self::NoServerWithPrompt(_)
        )
    }

    /// Operation hit a registry that is not connected.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected(_))
    }

    /// A remote call ran and failed.
    pub fn is_execution(&self) -> bool {
        matches!(
            self,
            Self::Execution { .. } | Self::Timeout { .. } | Self::ResourceUnavailable { .. }
        )
    }
}
