// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability registry for a single MCP server.
//!
//! `McpServer` owns one connection's lifecycle and the capability lists
//! discovered over it. The caches are populated only while the state is
//! [`ConnectionState::Connected`]; every transition away from it clears them.
//!
//! Connect and disconnect are serialized by a lifecycle lock, so a reload
//! racing a user-initiated disconnect cannot leave the transport half closed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::config::ServerDescriptor;
use super::error::McpError;
use super::session::{McpSession, SessionConnector};
use super::types::{
    ConnectionState, JsonObject, Prompt, PromptContent, PromptFormat, Resource, ResourceContents,
    ResourceTemplate, ServerIdentity, Tool, ToolOutput,
};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// Capability lists discovered on connect.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub tools: Vec<Tool>,
    pub resources: Vec<Resource>,
    pub resource_templates: Vec<ResourceTemplate>,
    pub prompts: Vec<Prompt>,
    pub prompt_formats: Vec<PromptFormat>,
}

/// Point-in-time view of a server for display.
#[derive(Debug, Clone)]
pub struct ServerStatus {
    pub name: String,
    pub transport: &'static str,
    pub endpoint: String,
    pub enabled: bool,
    pub default: bool,
    pub state: ConnectionState,
    pub identity: Option<ServerIdentity>,
    pub connected_at: Option<DateTime<Utc>>,
    pub tool_count: usize,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct ServerState {
    state: ConnectionState,
    session: Option<Arc<dyn McpSession>>,
    identity: Option<ServerIdentity>,
    connected_at: Option<DateTime<Utc>>,
    capabilities: Capabilities,
    last_error: Option<String>,
}

/// One server's connection plus its capability cache.
pub struct McpServer {
    descriptor: ServerDescriptor,
    connector: Arc<dyn SessionConnector>,
    lifecycle: Mutex<()>,
    inner: RwLock<ServerState>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("name", &self.descriptor.name)
            .field("transport", &self.descriptor.transport.kind())
            .finish()
    }
}

impl McpServer {
    /// Create a disconnected registry for a descriptor.
    pub fn new(descriptor: ServerDescriptor, connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            descriptor,
            connector,
            lifecycle: Mutex::new(()),
            inner: RwLock::new(ServerState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &ServerDescriptor {
        &self.descriptor
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    pub async fn identity(&self) -> Option<ServerIdentity> {
        self.inner.read().await.identity.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Connect and run capability discovery.
    ///
    /// Returns immediately if already connected. On failure the registry is
    /// torn down and left in [`ConnectionState::Failed`].
    #[instrument(skip(self), fields(server = %self.descriptor.name))]
    pub async fn connect(&self) -> Result<(), McpError> {
        let _guard = self.lifecycle.lock().await;

        if self.state().await == ConnectionState::Connected {
            return Ok(());
        }

        // A connect dropped mid-discovery leaves its session behind.
        if self.inner.read().await.session.is_some() {
            debug!("Closing session left by an interrupted connect");
            if let Err(e) = self.teardown(ConnectionState::Disconnected).await {
                debug!(error = %e, "Closing stale session failed");
            }
        }

        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        self.inner.write().await.state = ConnectionState::Connecting;

        let result = self.open_and_discover().await;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("mcp.connect", start.elapsed());

        if let Err(ref e) = result {
            warn!(error = %e, "Connection failed");
            let message = e.to_string();
            if let Err(close_err) = self.teardown(ConnectionState::Failed).await {
                debug!(error = %close_err, "Teardown after failed connect also failed");
            }
            self.inner.write().await.last_error = Some(message);
        }
        result
    }

    async fn open_and_discover(&self) -> Result<(), McpError> {
        let name = self.name();
        self.descriptor.transport.validate(name)?;

        let startup = self.descriptor.startup_timeout();
        let session: Arc<dyn McpSession> =
            match timeout(startup, self.connector.open(&self.descriptor)).await {
                Ok(Ok(session)) => Arc::from(session),
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(McpError::connection(
                        name,
                        format!("handshake timed out after {}s", self.descriptor.startup_timeout_sec),
                    ))
                }
            };

        // Stored before discovery so the next connect or disconnect can close it.
        self.inner.write().await.session = Some(session.clone());

        let identity = session.identity();
        info!(identity = %identity.name, version = %identity.version, "Handshake complete");

        let tools = self.discover("tools", session.list_tools()).await;
        let resources = self.discover("resources", session.list_resources()).await;
        let resource_templates = self
            .discover("resource templates", session.list_resource_templates())
            .await;
        let prompts = self.discover("prompts", session.list_prompts()).await;
        let prompt_formats = self
            .discover("prompt formats", session.list_prompt_formats())
            .await;

        let tools: Vec<Tool> = dedupe_by_name(tools, |t| &t.name)
            .into_iter()
            .filter(|t| self.descriptor.is_tool_enabled(&t.name))
            .collect();
        let prompts = dedupe_by_name(prompts, |p| &p.name);

        info!(
            tools = tools.len(),
            resources = resources.len(),
            templates = resource_templates.len(),
            prompts = prompts.len(),
            "Capability discovery complete"
        );

        let mut inner = self.inner.write().await;
        inner.state = ConnectionState::Connected;
        inner.identity = Some(identity);
        inner.connected_at = Some(Utc::now());
        inner.last_error = None;
        inner.capabilities = Capabilities {
            tools,
            resources,
            resource_templates,
            prompts,
            prompt_formats,
        };
        Ok(())
    }

    /// Run one discovery step; any failure yields an empty list.
    async fn discover<T, F>(&self, what: &str, step: F) -> Vec<T>
    where
        F: Future<Output = Result<Vec<T>, McpError>>,
    {
        match timeout(self.descriptor.startup_timeout(), step).await {
            Ok(Ok(items)) => items,
            Ok(Err(McpError::Unsupported(_))) => {
                info!(server = %self.name(), "Server does not offer {}", what);
                Vec::new()
            }
            Ok(Err(e)) => {
                warn!(server = %self.name(), error = %e, "Failed to list {}", what);
                Vec::new()
            }
            Err(_) => {
                warn!(server = %self.name(), "Listing {} timed out", what);
                Vec::new()
            }
        }
    }

    /// Disconnect and clear all cached state. Safe to call repeatedly.
    #[instrument(skip(self), fields(server = %self.descriptor.name))]
    pub async fn disconnect(&self) -> Result<(), McpError> {
        let _guard = self.lifecycle.lock().await;
        self.teardown(ConnectionState::Disconnected).await
    }

    /// Reset state, then close the session if one was open.
    async fn teardown(&self, next: ConnectionState) -> Result<(), McpError> {
        let session = {
            let mut inner = self.inner.write().await;
            let session = inner.session.take();
            *inner = ServerState {
                state: next,
                ..ServerState::default()
            };
            session
        };

        match session {
            Some(session) => {
                debug!("Closing session");
                session.close().await
            }
            None => Ok(()),
        }
    }

    async fn connected_session(&self) -> Result<Arc<dyn McpSession>, McpError> {
        let inner = self.inner.read().await;
        match (&inner.state, &inner.session) {
            (ConnectionState::Connected, Some(session)) => Ok(session.clone()),
            _ => Err(McpError::NotConnected(self.name().to_string())),
        }
    }

    /// Call a tool with the descriptor's retry policy.
    pub async fn execute_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
        self.execute_tool_with_retry(
            name,
            arguments,
            self.descriptor.tool_retries,
            self.descriptor.retry_delay(),
        )
        .await
    }

    /// Call a tool, making up to `retries` attempts with a flat `delay`
    /// between them. The last error is returned unchanged.
    #[instrument(skip(self, arguments), fields(server = %self.descriptor.name))]
    pub async fn execute_tool_with_retry(
        &self,
        name: &str,
        arguments: JsonObject,
        retries: u32,
        delay: Duration,
    ) -> Result<ToolOutput, McpError> {
        let session = self.connected_session().await?;
        let attempts = retries.max(1);
        let call_timeout = self.descriptor.tool_timeout();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let start = Instant::now();
            let result = match timeout(call_timeout, session.call_tool(name, arguments.clone())).await {
                Ok(result) => result,
                Err(_) => Err(McpError::timeout(
                    format!("call_tool {}", name),
                    self.descriptor.tool_timeout_sec,
                )),
            };

            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_tool(name, start.elapsed(), result.is_ok());

            match result {
                Ok(output) => {
                    debug!(tool = name, attempt, elapsed_ms = start.elapsed().as_millis() as u64, "Tool call succeeded");
                    return Ok(output);
                }
                Err(e) if attempt < attempts => {
                    warn!(tool = name, attempt, attempts, error = %e, "Tool call failed, retrying");
                    #[cfg(feature = "telemetry")]
                    GLOBAL_METRICS.increment("mcp.tool_retry");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read a resource. Errors are returned without retry.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
        let session = self.connected_session().await?;
        if uri.trim().is_empty() {
            return Err(McpError::InvalidRequest("resource URI must not be empty".to_string()));
        }

        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let result = match timeout(self.descriptor.tool_timeout(), session.read_resource(uri)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::timeout("read_resource", self.descriptor.tool_timeout_sec)),
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("mcp.read_resource", start.elapsed());

        result
    }

    /// Render a prompt on the server.
    pub async fn render_prompt(
        &self,
        name: &str,
        arguments: JsonObject,
        format: Option<&str>,
    ) -> Result<PromptContent, McpError> {
        let session = self.connected_session().await?;
        match timeout(self.descriptor.tool_timeout(), session.get_prompt(name, arguments, format)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::timeout(
                format!("get_prompt {}", name),
                self.descriptor.tool_timeout_sec,
            )),
        }
    }

    pub async fn tools(&self) -> Vec<Tool> {
        self.inner.read().await.capabilities.tools.clone()
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.inner.read().await.capabilities.resources.clone()
    }

    pub async fn resource_templates(&self) -> Vec<ResourceTemplate> {
        self.inner.read().await.capabilities.resource_templates.clone()
    }

    pub async fn prompts(&self) -> Vec<Prompt> {
        self.inner.read().await.capabilities.prompts.clone()
    }

    pub async fn prompt_formats(&self) -> Vec<PromptFormat> {
        self.inner.read().await.capabilities.prompt_formats.clone()
    }

    pub async fn has_tool(&self, name: &str) -> bool {
        self.get_tool(name).await.is_some()
    }

    pub async fn get_tool(&self, name: &str) -> Option<Tool> {
        let inner = self.inner.read().await;
        inner.capabilities.tools.iter().find(|t| t.name == name).cloned()
    }

    pub async fn has_prompt(&self, name: &str) -> bool {
        self.get_prompt(name).await.is_some()
    }

    pub async fn get_prompt(&self, name: &str) -> Option<Prompt> {
        let inner = self.inner.read().await;
        inner.capabilities.prompts.iter().find(|p| p.name == name).cloned()
    }

    pub async fn has_prompt_format(&self, name: &str) -> bool {
        let inner = self.inner.read().await;
        inner.capabilities.prompt_formats.iter().any(|f| f.name == name)
    }

    /// Snapshot for display.
    pub async fn status(&self) -> ServerStatus {
        let inner = self.inner.read().await;
        ServerStatus {
            name: self.descriptor.name.clone(),
            transport: self.descriptor.transport.kind(),
            endpoint: self.descriptor.transport.endpoint(),
            enabled: self.descriptor.enabled,
            default: self.descriptor.default,
            state: inner.state,
            identity: inner.identity.clone(),
            connected_at: inner.connected_at,
            tool_count: inner.capabilities.tools.len(),
            last_error: inner.last_error.clone(),
        }
    }
}

/// Drop duplicate names. The last reported entry wins; first position is kept.
fn dedupe_by_name<T>(items: Vec<T>, name: impl Fn(&T) -> &String) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match out.iter().position(|existing| name(existing) == name(&item)) {
            Some(index) => out[index] = item,
            None => out.push(item),
        }
    }
    out
}
