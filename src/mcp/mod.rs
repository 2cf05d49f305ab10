// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model Context Protocol client core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ServerManager                        │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐     │
//! │  │ McpServer   │  │ McpServer   │  │ McpServer   │     │
//! │  │ (weather)   │  │ (files)     │  │ (search)    │     │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘     │
//! └─────────┼────────────────┼────────────────┼─────────────┘
//!           │                │                │
//!     ┌─────▼─────┐    ┌─────▼─────┐    ┌─────▼─────┐
//!     │ McpSession│    │ McpSession│    │ McpSession│
//!     │  (stdio)  │    │   (sse)   │    │  (stdio)  │
//!     └───────────┘    └───────────┘    └───────────┘
//! ```
//!
//! [`McpToolAdapter`] flattens the manager into the [`ToolInvoker`] surface
//! the agent loop calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcpsh::mcp::{RmcpConnector, ServerDescriptor, ServerManager};
//!
//! let manager = ServerManager::with_servers(
//!     Arc::new(RmcpConnector),
//!     [ServerDescriptor::stream("weather", "http://localhost:8000/mcp")],
//! );
//! manager.connect_server("weather").await?;
//! let output = manager.execute_tool("get_forecast", args, None).await?;
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod manager;
pub mod server;
pub mod session;
pub mod types;

pub use adapter::{McpToolAdapter, ToolInvoker};
pub use config::{ServerDescriptor, Transport};
pub use error::McpError;
pub use manager::{DescriptorStore, ServerManager};
pub use server::{Capabilities, McpServer, ServerStatus};
pub use session::{McpSession, RmcpConnector, SessionConnector};
pub use types::*;
