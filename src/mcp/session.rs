// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session seam between the capability registry and the wire protocol.
//!
//! [`McpSession`] is everything the registry needs from a live connection;
//! [`SessionConnector`] opens one from a descriptor. The production pair is
//! backed by `rmcp`. Results cross the seam as typed values produced by the
//! `decode` functions in [`super::types`].

use async_trait::async_trait;
use rmcp::service::{Peer, RoleClient, RunningService, ServiceError, ServiceExt};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::{ServerDescriptor, Transport};
use super::error::McpError;
use super::types::{
    decode_list, JsonObject, Prompt, PromptContent, PromptFormat, Resource, ResourceContents,
    ResourceTemplate, ServerIdentity, Tool, ToolOutput,
};

/// A live, initialized connection to one server.
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Identity reported by the handshake.
    fn identity(&self) -> ServerIdentity;

    async fn list_tools(&self) -> Result<Vec<Tool>, McpError>;

    async fn list_resources(&self) -> Result<Vec<Resource>, McpError>;

    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError>;

    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError>;

    /// Optional capability; most servers do not offer it.
    async fn list_prompt_formats(&self) -> Result<Vec<PromptFormat>, McpError> {
        Err(McpError::Unsupported("prompt formats".to_string()))
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError>;

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError>;

    async fn get_prompt(
        &self,
        name: &str,
        arguments: JsonObject,
        format: Option<&str>,
    ) -> Result<PromptContent, McpError>;

    /// Release the transport. Called exactly once by the registry.
    async fn close(&self) -> Result<(), McpError>;
}

/// Opens sessions. Performs the transport handshake.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn open(&self, descriptor: &ServerDescriptor) -> Result<Box<dyn McpSession>, McpError>;
}

// ============================================================================
// rmcp backend
// ============================================================================

/// Connector that speaks MCP through `rmcp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RmcpConnector;

#[async_trait]
impl SessionConnector for RmcpConnector {
    async fn open(&self, descriptor: &ServerDescriptor) -> Result<Box<dyn McpSession>, McpError> {
        let name = descriptor.name.as_str();
        let service = match &descriptor.transport {
            Transport::Stream { url } => {
                debug!(server = name, url = %url, "Opening streamable HTTP transport");
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                ().serve(transport)
                    .await
                    .map_err(|e| McpError::connection(name, e.to_string()))?
            }
            Transport::Process { command, args, env, cwd } => {
                debug!(server = name, command = %command, "Spawning stdio server");
                let mut cmd = Command::new(command);
                cmd.args(args).envs(env);
                if let Some(dir) = cwd {
                    cmd.current_dir(dir);
                }
                let transport = TokioChildProcess::new(cmd)
                    .map_err(|e| McpError::connection(name, format!("failed to spawn '{}': {}", command, e)))?;
                ().serve(transport)
                    .await
                    .map_err(|e| McpError::connection(name, e.to_string()))?
            }
        };

        let identity = ServerIdentity::decode(&to_json(service.peer_info()));
        let peer = service.peer().clone();
        Ok(Box::new(RmcpSession {
            identity,
            peer,
            service: Mutex::new(Some(service)),
        }))
    }
}

/// Session over an `rmcp` running client service.
struct RmcpSession {
    identity: ServerIdentity,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn failed(operation: &str) -> impl Fn(ServiceError) -> McpError + '_ {
    move |e| McpError::execution(operation, e.to_string())
}

/// Build an rmcp request parameter from its JSON form.
fn params<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|e| McpError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl McpSession for RmcpSession {
    fn identity(&self) -> ServerIdentity {
        self.identity.clone()
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let tools = self.peer.list_all_tools().await.map_err(failed("list_tools"))?;
        Ok(decode_list(&to_json(tools), "tools", Tool::decode))
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        let resources = self
            .peer
            .list_all_resources()
            .await
            .map_err(failed("list_resources"))?;
        Ok(decode_list(&to_json(resources), "resources", Resource::decode))
    }

    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        let templates = self
            .peer
            .list_all_resource_templates()
            .await
            .map_err(failed("list_resource_templates"))?;
        Ok(decode_list(&to_json(templates), "resourceTemplates", ResourceTemplate::decode))
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        let prompts = self
            .peer
            .list_all_prompts()
            .await
            .map_err(failed("list_prompts"))?;
        Ok(decode_list(&to_json(prompts), "prompts", Prompt::decode))
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
        let operation = format!("call_tool {}", name);
        let request = params(json!({ "name": name, "arguments": arguments }))?;
        let result = self
            .peer
            .call_tool(request)
            .await
            .map_err(failed(&operation))?;
        Ok(ToolOutput::decode(&to_json(result)))
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
        let request = params(json!({ "uri": uri }))?;
        let result = self
            .peer
            .read_resource(request)
            .await
            .map_err(failed("read_resource"))?;
        Ok(ResourceContents::decode(&to_json(result)))
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: JsonObject,
        format: Option<&str>,
    ) -> Result<PromptContent, McpError> {
        if let Some(format) = format {
            debug!(prompt = name, format, "Prompt formats are not part of the protocol; ignoring");
        }
        let operation = format!("get_prompt {}", name);
        let request = params(json!({ "name": name, "arguments": arguments }))?;
        let result = self
            .peer
            .get_prompt(request)
            .await
            .map_err(failed(&operation))?;
        Ok(PromptContent::decode(&to_json(result)))
    }

    async fn close(&self) -> Result<(), McpError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        service
            .cancel()
            .await
            .map(|reason| debug!(?reason, "Session closed"))
            .map_err(|e| McpError::execution("close", e.to_string()))
    }
}
