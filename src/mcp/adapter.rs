// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Single invocation surface over every connected server's tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::McpError;
use super::manager::ServerManager;
use super::types::{JsonObject, Tool, ToolOutput};

/// What the agent loop needs from the tool side.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tools of every connected server, tagged with the owning server.
    async fn list_available_tools(&self) -> Vec<(String, Tool)>;

    /// Invoke a tool by name. Errors keep the manager's taxonomy.
    async fn invoke(&self, tool_name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError>;

    async fn connected_server_count(&self) -> usize;
}

/// Adapter from [`ServerManager`] to [`ToolInvoker`].
#[derive(Clone)]
pub struct McpToolAdapter {
    manager: Arc<ServerManager>,
}

impl McpToolAdapter {
    pub fn new(manager: Arc<ServerManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ServerManager> {
        &self.manager
    }
}

#[async_trait]
impl ToolInvoker for McpToolAdapter {
    async fn list_available_tools(&self) -> Vec<(String, Tool)> {
        self.manager.all_tools().await
    }

    async fn invoke(&self, tool_name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
        self.manager.execute_tool(tool_name, arguments, None).await
    }

    async fn connected_server_count(&self) -> usize {
        self.manager.get_connected_servers().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::config::ServerDescriptor;
    use crate::mcp::session::{McpSession, SessionConnector};
    use crate::mcp::types::{Prompt, PromptContent, Resource, ResourceContents, ResourceTemplate, ServerIdentity};

    struct EchoSession;

    #[async_trait]
    impl McpSession for EchoSession {
        fn identity(&self) -> ServerIdentity {
            ServerIdentity::default()
        }
        async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
            Ok(vec![Tool::new("echo", "Echo the input")])
        }
        async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
            Ok(Vec::new())
        }
        async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
            Ok(Vec::new())
        }
        async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
            Ok(Vec::new())
        }
        async fn call_tool(&self, _name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
            Ok(ToolOutput::text(serde_json::Value::Object(arguments).to_string()))
        }
        async fn read_resource(&self, _uri: &str) -> Result<ResourceContents, McpError> {
            Err(McpError::Unsupported("resources".into()))
        }
        async fn get_prompt(&self, _n: &str, _a: JsonObject, _f: Option<&str>) -> Result<PromptContent, McpError> {
            Err(McpError::Unsupported("prompts".into()))
        }
        async fn close(&self) -> Result<(), McpError> {
            Ok(())
        }
    }

    struct EchoConnector;

    #[async_trait]
    impl SessionConnector for EchoConnector {
        async fn open(&self, _d: &ServerDescriptor) -> Result<Box<dyn McpSession>, McpError> {
            Ok(Box::new(EchoSession))
        }
    }

    #[tokio::test]
    async fn test_adapter_delegates() {
        let manager = Arc::new(ServerManager::with_servers(
            Arc::new(EchoConnector),
            [ServerDescriptor::stdio("echo", "cmd")],
        ));
        let adapter = McpToolAdapter::new(manager.clone());
        assert_eq!(adapter.connected_server_count().await, 0);
        assert!(adapter.list_available_tools().await.is_empty());

        manager.connect_server("echo").await.unwrap();
        assert_eq!(adapter.connected_server_count().await, 1);
        assert_eq!(adapter.list_available_tools().await[0].1.name, "echo");

        let mut args = JsonObject::new();
        args.insert("a".into(), serde_json::json!(1));
        let out = adapter.invoke("echo", args).await.unwrap();
        assert_eq!(out.as_text(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_adapter_keeps_error_taxonomy() {
        let manager = Arc::new(ServerManager::with_servers(
            Arc::new(EchoConnector),
            [ServerDescriptor::stdio("echo", "cmd")],
        ));
        let adapter = McpToolAdapter::new(manager);

        let err = adapter.invoke("echo", JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, McpError::NoServerWithTool(_)));
    }
}
