// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Named collection of server registries.
//!
//! The manager routes tool, resource and prompt requests to the right
//! [`McpServer`] and builds the cross-server views. Servers are kept in
//! registration order; every "first match" rule below follows that order.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::config::ServerDescriptor;
use super::error::McpError;
use super::server::{McpServer, ServerStatus};
use super::session::SessionConnector;
use super::types::{
    JsonObject, Prompt, PromptContent, Resource, ResourceContents, ResourceTemplate, Tool,
    ToolOutput,
};

/// Persists the server table after the live set changes.
#[cfg_attr(test, mockall::automock)]
pub trait DescriptorStore: Send + Sync {
    fn save_servers(&self, servers: &[ServerDescriptor]) -> Result<(), McpError>;
}

/// Owns every configured server.
pub struct ServerManager {
    servers: RwLock<Vec<Arc<McpServer>>>,
    connector: Arc<dyn SessionConnector>,
    store: Option<Arc<dyn DescriptorStore>>,
}

impl ServerManager {
    /// Create an empty manager.
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            servers: RwLock::new(Vec::new()),
            connector,
            store: None,
        }
    }

    /// Create a manager preloaded with descriptors, in order.
    pub fn with_servers(
        connector: Arc<dyn SessionConnector>,
        descriptors: impl IntoIterator<Item = ServerDescriptor>,
    ) -> Self {
        let servers = descriptors
            .into_iter()
            .map(|d| Arc::new(McpServer::new(d, connector.clone())))
            .collect();
        Self {
            servers: RwLock::new(servers),
            connector,
            store: None,
        }
    }

    /// Persist add/remove through `store`.
    pub fn with_store(mut self, store: Arc<dyn DescriptorStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a new server. The configuration is written only after the
    /// in-memory change; if the write fails the change is rolled back.
    pub async fn add_server(&self, descriptor: ServerDescriptor) -> Result<(), McpError> {
        descriptor.transport.validate(&descriptor.name)?;

        let mut servers = self.servers.write().await;
        if servers.iter().any(|s| s.name() == descriptor.name) {
            return Err(McpError::DuplicateServer(descriptor.name));
        }

        let name = descriptor.name.clone();
        servers.push(Arc::new(McpServer::new(descriptor, self.connector.clone())));

        if let Err(e) = self.persist(&servers) {
            servers.pop();
            return Err(e);
        }

        info!(server = %name, "Server added");
        Ok(())
    }

    /// Remove a server, disconnecting it first if needed.
    pub async fn remove_server(&self, name: &str) -> Result<(), McpError> {
        let server = self
            .server(name)
            .await
            .ok_or_else(|| McpError::ServerNotFound(name.to_string()))?;

        if let Err(e) = server.disconnect().await {
            warn!(server = name, error = %e, "Disconnect before removal failed");
        }

        let mut servers = self.servers.write().await;
        let Some(index) = servers.iter().position(|s| s.name() == name) else {
            return Err(McpError::ServerNotFound(name.to_string()));
        };
        let removed = servers.remove(index);

        if let Err(e) = self.persist(&servers) {
            servers.insert(index, removed);
            return Err(e);
        }

        info!(server = name, "Server removed");
        Ok(())
    }

    /// Swap the whole server set, disconnecting everything first.
    /// Used by configuration reload; nothing is persisted.
    pub async fn replace_servers(
        &self,
        descriptors: impl IntoIterator<Item = ServerDescriptor>,
    ) -> Vec<(String, McpError)> {
        let failures = self.disconnect_all().await;
        let fresh: Vec<Arc<McpServer>> = descriptors
            .into_iter()
            .map(|d| Arc::new(McpServer::new(d, self.connector.clone())))
            .collect();
        *self.servers.write().await = fresh;
        failures
    }

    fn persist(&self, servers: &[Arc<McpServer>]) -> Result<(), McpError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let descriptors: Vec<ServerDescriptor> =
            servers.iter().map(|s| s.descriptor().clone()).collect();
        store.save_servers(&descriptors)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub async fn server(&self, name: &str) -> Option<Arc<McpServer>> {
        self.servers
            .read()
            .await
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub async fn servers(&self) -> Vec<Arc<McpServer>> {
        self.servers.read().await.clone()
    }

    pub async fn server_names(&self) -> Vec<String> {
        self.servers
            .read()
            .await
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub async fn descriptors(&self) -> Vec<ServerDescriptor> {
        self.servers
            .read()
            .await
            .iter()
            .map(|s| s.descriptor().clone())
            .collect()
    }

    /// The server used when an operation names none: the first enabled
    /// server marked default, else the first enabled server.
    pub async fn default_server_name(&self) -> Option<String> {
        let servers = self.servers.read().await;
        let enabled = || servers.iter().filter(|s| s.descriptor().enabled);
        enabled()
            .find(|s| s.descriptor().default)
            .or_else(|| enabled().next())
            .map(|s| s.name().to_string())
    }

    /// `name` if given, else the default server.
    pub async fn resolve_server_name(&self, name: Option<&str>) -> Result<String, McpError> {
        match name {
            Some(name) => Ok(name.to_string()),
            None => self.default_server_name().await.ok_or_else(|| {
                McpError::InvalidRequest("no server named and no enabled server configured".to_string())
            }),
        }
    }

    pub async fn statuses(&self) -> Vec<ServerStatus> {
        let mut out = Vec::new();
        for server in self.servers().await {
            out.push(server.status().await);
        }
        out
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub async fn connect_server(&self, name: &str) -> Result<(), McpError> {
        let server = self
            .server(name)
            .await
            .ok_or_else(|| McpError::ServerNotFound(name.to_string()))?;
        server.connect().await
    }

    pub async fn disconnect_server(&self, name: &str) -> Result<(), McpError> {
        let server = self
            .server(name)
            .await
            .ok_or_else(|| McpError::ServerNotFound(name.to_string()))?;
        server.disconnect().await
    }

    /// Connect every enabled server. Failures are collected, not fatal.
    pub async fn connect_enabled(&self) -> Vec<(String, McpError)> {
        let mut failures = Vec::new();
        for server in self.servers().await {
            if !server.descriptor().enabled {
                debug!(server = %server.name(), "Skipping disabled server");
                continue;
            }
            if let Err(e) = server.connect().await {
                failures.push((server.name().to_string(), e));
            }
        }
        failures
    }

    /// Disconnect every server. Each failure is isolated and reported.
    pub async fn disconnect_all(&self) -> Vec<(String, McpError)> {
        let mut failures = Vec::new();
        for server in self.servers().await {
            if let Err(e) = server.disconnect().await {
                warn!(server = %server.name(), error = %e, "Disconnect failed");
                failures.push((server.name().to_string(), e));
            }
        }
        failures
    }

    /// Servers in the connected state, in registration order.
    pub async fn get_connected_servers(&self) -> Vec<Arc<McpServer>> {
        let mut connected = Vec::new();
        for server in self.servers().await {
            if server.is_connected().await {
                connected.push(server);
            }
        }
        connected
    }

    // ========================================================================
    // Aggregate views
    // ========================================================================

    /// Tools of every connected server, tagged with the server name.
    pub async fn all_tools(&self) -> Vec<(String, Tool)> {
        let mut out = Vec::new();
        for server in self.get_connected_servers().await {
            let name = server.name().to_string();
            out.extend(server.tools().await.into_iter().map(|t| (name.clone(), t)));
        }
        out
    }

    pub async fn all_resources(&self) -> Vec<(String, Resource)> {
        let mut out = Vec::new();
        for server in self.get_connected_servers().await {
            let name = server.name().to_string();
            out.extend(server.resources().await.into_iter().map(|r| (name.clone(), r)));
        }
        out
    }

    pub async fn all_resource_templates(&self) -> Vec<(String, ResourceTemplate)> {
        let mut out = Vec::new();
        for server in self.get_connected_servers().await {
            let name = server.name().to_string();
            out.extend(
                server
                    .resource_templates()
                    .await
                    .into_iter()
                    .map(|t| (name.clone(), t)),
            );
        }
        out
    }

    pub async fn all_prompts(&self) -> Vec<(String, Prompt)> {
        let mut out = Vec::new();
        for server in self.get_connected_servers().await {
            let name = server.name().to_string();
            out.extend(server.prompts().await.into_iter().map(|p| (name.clone(), p)));
        }
        out
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// First connected server exposing `tool_name`.
    pub async fn get_server_with_tool(&self, tool_name: &str) -> Option<Arc<McpServer>> {
        for server in self.get_connected_servers().await {
            if server.has_tool(tool_name).await {
                return Some(server);
            }
        }
        None
    }

    /// First connected server exposing prompt `name`.
    pub async fn get_server_with_prompt(&self, name: &str) -> Option<Arc<McpServer>> {
        for server in self.get_connected_servers().await {
            if server.has_prompt(name).await {
                return Some(server);
            }
        }
        None
    }

    /// Resolve an explicitly named server that must be connected.
    async fn connected_named(&self, name: &str) -> Result<Arc<McpServer>, McpError> {
        let server = self
            .server(name)
            .await
            .ok_or_else(|| McpError::ServerNotFound(name.to_string()))?;
        if !server.is_connected().await {
            return Err(McpError::NotConnected(name.to_string()));
        }
        Ok(server)
    }

    /// Execute a tool, on `server_name` if given or on the first connected
    /// server that has it.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: JsonObject,
        server_name: Option<&str>,
    ) -> Result<ToolOutput, McpError> {
        let server = match server_name {
            Some(name) => {
                let server = self.connected_named(name).await?;
                if !server.has_tool(tool_name).await {
                    return Err(McpError::ToolNotFound {
                        server: name.to_string(),
                        tool: tool_name.to_string(),
                    });
                }
                server
            }
            None => self
                .get_server_with_tool(tool_name)
                .await
                .ok_or_else(|| McpError::NoServerWithTool(tool_name.to_string()))?,
        };

        debug!(server = %server.name(), tool = tool_name, "Routing tool call");
        server.execute_tool(tool_name, arguments).await
    }

    /// Read a resource. Without a server hint every connected server is
    /// tried in order and the first success wins.
    pub async fn get_resource(
        &self,
        uri: &str,
        server_name: Option<&str>,
    ) -> Result<ResourceContents, McpError> {
        if let Some(name) = server_name {
            return self.connected_named(name).await?.read_resource(uri).await;
        }

        let mut last_error = String::from("no connected servers");
        for server in self.get_connected_servers().await {
            match server.read_resource(uri).await {
                Ok(contents) => return Ok(contents),
                Err(e) => {
                    debug!(server = %server.name(), uri, error = %e, "Resource read failed, trying next server");
                    last_error = format!("{}: {}", server.name(), e);
                }
            }
        }

        Err(McpError::ResourceUnavailable {
            uri: uri.to_string(),
            message: last_error,
        })
    }

    /// Render a prompt; routing follows [`Self::execute_tool`].
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: JsonObject,
        format_name: Option<&str>,
        server_name: Option<&str>,
    ) -> Result<PromptContent, McpError> {
        let server = match server_name {
            Some(server_name) => {
                let server = self.connected_named(server_name).await?;
                if !server.has_prompt(name).await {
                    return Err(McpError::PromptNotFound {
                        server: server_name.to_string(),
                        prompt: name.to_string(),
                    });
                }
                server
            }
            None => self
                .get_server_with_prompt(name)
                .await
                .ok_or_else(|| McpError::NoServerWithPrompt(name.to_string()))?,
        };

        if let Some(format) = format_name {
            if !server.has_prompt_format(format).await {
                debug!(server = %server.name(), format, "Server did not advertise prompt format");
            }
        }

        server.render_prompt(name, arguments, format_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::session::McpSession;
    use crate::mcp::types::{PromptFormat, ServerIdentity};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Per-server fixture: the tools it exposes and whether reads fail.
    #[derive(Clone, Default)]
    struct Fixture {
        tools: Vec<&'static str>,
        prompts: Vec<&'static str>,
        fail_reads: bool,
    }

    struct FixtureSession {
        server: String,
        fixture: Fixture,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl McpSession for FixtureSession {
        fn identity(&self) -> ServerIdentity {
            ServerIdentity::default()
        }
        async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
            Ok(self.fixture.tools.iter().map(|t| Tool::new(*t, "")).collect())
        }
        async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
            Ok(Vec::new())
        }
        async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
            Ok(Vec::new())
        }
        async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
            Ok(self
                .fixture
                .prompts
                .iter()
                .filter_map(|p| Prompt::decode(&serde_json::json!({ "name": p })))
                .collect())
        }
        async fn list_prompt_formats(&self) -> Result<Vec<PromptFormat>, McpError> {
            Ok(Vec::new())
        }
        async fn call_tool(&self, name: &str, _arguments: JsonObject) -> Result<ToolOutput, McpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::text(format!("{}:{}", self.server, name)))
        }
        async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
            if self.fixture.fail_reads {
                return Err(McpError::execution("read_resource", "gone"));
            }
            Ok(ResourceContents::text(uri, self.server.clone()))
        }
        async fn get_prompt(&self, name: &str, _a: JsonObject, _f: Option<&str>) -> Result<PromptContent, McpError> {
            Ok(PromptContent::decode(&serde_json::json!({
                "messages": [{ "role": "user", "content": { "type": "text", "text": format!("{}:{}", self.server, name) } }]
            })))
        }
        async fn close(&self) -> Result<(), McpError> {
            Ok(())
        }
    }

    struct FixtureConnector {
        fixtures: HashMap<String, Fixture>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SessionConnector for FixtureConnector {
        async fn open(&self, d: &ServerDescriptor) -> Result<Box<dyn McpSession>, McpError> {
            let fixture = self
                .fixtures
                .get(&d.name)
                .cloned()
                .ok_or_else(|| McpError::connection(&d.name, "unreachable"))?;
            Ok(Box::new(FixtureSession {
                server: d.name.clone(),
                fixture,
                calls: self.calls.clone(),
            }))
        }
    }

    async fn manager(fixtures: &[(&str, Fixture)]) -> (ServerManager, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let connector = Arc::new(FixtureConnector {
            fixtures: fixtures.iter().map(|(n, f)| (n.to_string(), f.clone())).collect(),
            calls: calls.clone(),
        });
        let descriptors = fixtures.iter().map(|(n, _)| ServerDescriptor::stdio(*n, "cmd"));
        let manager = ServerManager::with_servers(connector, descriptors);
        assert!(manager.connect_enabled().await.is_empty());
        (manager, calls)
    }

    fn tools(names: &[&'static str]) -> Fixture {
        Fixture {
            tools: names.to_vec(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_routes_to_only_server_with_tool() {
        let (manager, _) = manager(&[
            ("a", tools(&["one"])),
            ("b", tools(&["two"])),
            ("c", tools(&["three"])),
        ])
        .await;

        let out = manager.execute_tool("two", JsonObject::new(), None).await.unwrap();
        assert_eq!(out.as_text(), "b:two");
    }

    #[tokio::test]
    async fn test_first_registered_wins_tie() {
        let (manager, _) = manager(&[("first", tools(&["shared"])), ("second", tools(&["shared"]))]).await;

        for _ in 0..3 {
            let out = manager.execute_tool("shared", JsonObject::new(), None).await.unwrap();
            assert_eq!(out.as_text(), "first:shared");
        }
        let server = manager.get_server_with_tool("shared").await.unwrap();
        assert_eq!(server.name(), "first");
    }

    #[tokio::test]
    async fn test_unknown_tool_makes_no_remote_call() {
        let (manager, calls) = manager(&[("a", tools(&["one"])), ("b", tools(&["two"]))]).await;

        let err = manager.execute_tool("missing", JsonObject::new(), None).await.unwrap_err();
        assert!(matches!(err, McpError::NoServerWithTool(_)));
        assert!(err.is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_named_server_errors_are_distinct() {
        let (manager, calls) = manager(&[("a", tools(&["one"])), ("b", tools(&["two"]))]).await;
        manager.disconnect_server("b").await.unwrap();

        let err = manager.execute_tool("one", JsonObject::new(), Some("zzz")).await.unwrap_err();
        assert!(matches!(err, McpError::ServerNotFound(_)));

        let err = manager.execute_tool("two", JsonObject::new(), Some("b")).await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected(_)));

        let err = manager.execute_tool("two", JsonObject::new(), Some("a")).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound { .. }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let out = manager.execute_tool("one", JsonObject::new(), Some("a")).await.unwrap();
        assert_eq!(out.as_text(), "a:one");
    }

    #[tokio::test]
    async fn test_connected_servers_and_aggregates() {
        let (manager, _) = manager(&[("a", tools(&["one", "two"])), ("b", tools(&["three"]))]).await;
        assert_eq!(manager.all_tools().await.len(), 3);

        manager.disconnect_server("a").await.unwrap();
        let connected = manager.get_connected_servers().await;
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].name(), "b");
        assert_eq!(manager.all_tools().await, vec![("b".to_string(), Tool::new("three", ""))]);
    }

    #[tokio::test]
    async fn test_resource_fallback_across_servers() {
        let (manager, _) = manager(&[
            ("broken", Fixture { fail_reads: true, ..Default::default() }),
            ("good", Fixture::default()),
        ])
        .await;

        let contents = manager.get_resource("mem://x", None).await.unwrap();
        assert_eq!(contents.as_text(), "good");

        let err = manager.get_resource("mem://x", Some("broken")).await.unwrap_err();
        assert!(err.is_execution());
    }

    #[tokio::test]
    async fn test_resource_fails_only_when_all_fail() {
        let broken = Fixture { fail_reads: true, ..Default::default() };
        let (manager, _) = manager(&[("a", broken.clone()), ("b", broken)]).await;

        let err = manager.get_resource("mem://x", None).await.unwrap_err();
        assert!(matches!(err, McpError::ResourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_prompt_routing() {
        let with_prompt = Fixture { prompts: vec!["greet"], ..Default::default() };
        let (manager, _) = manager(&[("a", Fixture::default()), ("b", with_prompt)]).await;

        let content = manager.get_prompt("greet", JsonObject::new(), None, None).await.unwrap();
        assert!(content.as_text().contains("b:greet"));

        let err = manager.get_prompt("greet", JsonObject::new(), None, Some("a")).await.unwrap_err();
        assert!(matches!(err, McpError::PromptNotFound { .. }));

        let err = manager.get_prompt("nope", JsonObject::new(), None, None).await.unwrap_err();
        assert!(matches!(err, McpError::NoServerWithPrompt(_)));
    }

    #[tokio::test]
    async fn test_disconnect_all_attempts_every_server() {
        let (manager, _) = manager(&[("a", tools(&["one"])), ("b", tools(&["two"]))]).await;
        let failures = manager.disconnect_all().await;
        assert!(failures.is_empty());
        assert!(manager.get_connected_servers().await.is_empty());
        assert!(manager.disconnect_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_default_server_selection() {
        let (manager, _) = manager(&[]).await;
        assert_eq!(manager.default_server_name().await, None);

        let mut disabled = ServerDescriptor::stdio("off", "cmd");
        disabled.enabled = false;
        manager.add_server(disabled).await.unwrap();
        manager.add_server(ServerDescriptor::stdio("plain", "cmd")).await.unwrap();
        assert_eq!(manager.default_server_name().await.as_deref(), Some("plain"));

        manager
            .add_server(ServerDescriptor::stdio("marked", "cmd").as_default())
            .await
            .unwrap();
        assert_eq!(manager.default_server_name().await.as_deref(), Some("marked"));
    }

    #[tokio::test]
    async fn test_omitted_server_resolves_to_default() {
        let (manager, _) = manager(&[]).await;
        let err = manager.resolve_server_name(None).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidRequest(_)));

        manager.add_server(ServerDescriptor::stdio("first", "cmd")).await.unwrap();
        manager
            .add_server(ServerDescriptor::stdio("second", "cmd").as_default())
            .await
            .unwrap();
        assert_eq!(manager.resolve_server_name(None).await.unwrap(), "second");
        assert_eq!(manager.resolve_server_name(Some("first")).await.unwrap(), "first");
        assert_eq!(manager.resolve_server_name(Some("ghost")).await.unwrap(), "ghost");
    }

    #[tokio::test]
    async fn test_add_server_persists_after_change() {
        let (manager, _) = manager(&[("a", Fixture::default())]).await;
        let mut store = MockDescriptorStore::new();
        store
            .expect_save_servers()
            .withf(|servers| servers.len() == 2 && servers[1].name == "b")
            .times(1)
            .returning(|_| Ok(()));
        let manager = manager.with_store(Arc::new(store));

        manager.add_server(ServerDescriptor::stdio("b", "cmd")).await.unwrap();
        assert_eq!(manager.server_names().await, vec!["a", "b"]);

        let err = manager.add_server(ServerDescriptor::stdio("b", "cmd")).await.unwrap_err();
        assert!(matches!(err, McpError::DuplicateServer(_)));
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back() {
        let (manager, _) = manager(&[("a", tools(&["one"]))]).await;
        let mut store = MockDescriptorStore::new();
        store
            .expect_save_servers()
            .returning(|_| Err(McpError::Config("disk full".into())));
        let manager = manager.with_store(Arc::new(store));

        assert!(manager.add_server(ServerDescriptor::stdio("b", "cmd")).await.is_err());
        assert_eq!(manager.server_names().await, vec!["a"]);

        assert!(manager.remove_server("a").await.is_err());
        assert_eq!(manager.server_names().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_remove_disconnects_first() {
        let (manager, _) = manager(&[("a", tools(&["one"])), ("b", tools(&["two"]))]).await;
        let a = manager.server("a").await.unwrap();

        manager.remove_server("a").await.unwrap();
        assert!(!a.is_connected().await);
        assert_eq!(manager.server_names().await, vec!["b"]);

        let err = manager.remove_server("a").await.unwrap_err();
        assert!(matches!(err, McpError::ServerNotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_servers() {
        let (manager, _) = manager(&[("a", tools(&["one"]))]).await;
        let old = manager.server("a").await.unwrap();

        let failures = manager
            .replace_servers([ServerDescriptor::stdio("x", "cmd"), ServerDescriptor::stdio("y", "cmd")])
            .await;
        assert!(failures.is_empty());
        assert!(!old.is_connected().await);
        assert_eq!(manager.server_names().await, vec!["x", "y"]);
    }
}
