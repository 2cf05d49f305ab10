// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory servers and a scripted model shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mcpsh::mcp::{
    JsonObject, McpError, McpSession, Prompt, PromptContent, Resource, ResourceContents,
    ResourceTemplate, ServerDescriptor, ServerIdentity, SessionConnector, Tool, ToolOutput,
};
use mcpsh::{Message, Provider, ProviderError};

// ============================================================================
// Servers
// ============================================================================

/// How one in-memory server behaves.
#[derive(Clone, Default)]
pub struct ServerScript {
    pub tools: Vec<Tool>,
    /// Tool name to result text; unlisted tools echo `server:tool`.
    pub results: HashMap<String, String>,
    pub resources: Vec<Resource>,
    pub fail_resources: bool,
    pub fail_prompts: bool,
    /// The first N tool calls fail.
    pub call_failures: usize,
    pub call_delay: Option<Duration>,
}

impl ServerScript {
    pub fn with_tools(names: &[&str]) -> Self {
        Self {
            tools: names.iter().map(|n| Tool::new(*n, format!("The {} tool", n))).collect(),
            ..Default::default()
        }
    }

    pub fn returning(mut self, tool: &str, text: &str) -> Self {
        self.results.insert(tool.to_string(), text.to_string());
        self
    }
}

/// One observed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub server: String,
    pub tool: String,
    pub arguments: Value,
}

/// What every session did.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct MemorySession {
    server: String,
    script: ServerScript,
    failures_left: AtomicUsize,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl McpSession for MemorySession {
    fn identity(&self) -> ServerIdentity {
        ServerIdentity {
            name: format!("{}-server", self.server),
            version: "0.1.0".to_string(),
            protocol_version: None,
        }
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(self.script.tools.clone())
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        if self.script.fail_resources {
            return Err(McpError::execution("list_resources", "method not found"));
        }
        Ok(self.script.resources.clone())
    }

    async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        Ok(Vec::new())
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        if self.script.fail_prompts {
            return Err(McpError::execution("list_prompts", "method not found"));
        }
        Ok(Vec::new())
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, McpError> {
        self.recorder.calls.lock().unwrap().push(Call {
            server: self.server.clone(),
            tool: name.to_string(),
            arguments: Value::Object(arguments),
        });

        if let Some(delay) = self.script.call_delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(McpError::execution(format!("call_tool {}", name), "transient failure"));
        }

        let text = self
            .script
            .results
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}:{}", self.server, name));
        Ok(ToolOutput::text(text))
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
        Ok(ResourceContents::text(uri, format!("{} from {}", uri, self.server)))
    }

    async fn get_prompt(
        &self,
        name: &str,
        _arguments: JsonObject,
        _format: Option<&str>,
    ) -> Result<PromptContent, McpError> {
        Ok(PromptContent::decode(&json!({
            "messages": [{ "role": "user", "content": { "type": "text", "text": name } }]
        })))
    }

    async fn close(&self) -> Result<(), McpError> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector over named scripts. Unknown names fail the handshake.
#[derive(Default)]
pub struct MemoryConnector {
    scripts: HashMap<String, ServerScript>,
    pub recorder: Arc<Recorder>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, name: &str, script: ServerScript) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }
}

#[async_trait]
impl SessionConnector for MemoryConnector {
    async fn open(&self, descriptor: &ServerDescriptor) -> Result<Box<dyn McpSession>, McpError> {
        self.recorder.opens.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&descriptor.name)
            .cloned()
            .ok_or_else(|| McpError::connection(&descriptor.name, "connection refused"))?;
        Ok(Box::new(MemorySession {
            server: descriptor.name.clone(),
            failures_left: AtomicUsize::new(script.call_failures),
            script,
            recorder: self.recorder.clone(),
        }))
    }
}

/// Process descriptors for `names`, in order.
pub fn descriptors(names: &[&str]) -> Vec<ServerDescriptor> {
    names.iter().map(|n| ServerDescriptor::stdio(*n, format!("{}-server", n))).collect()
}

// ============================================================================
// Model
// ============================================================================

/// Provider that replays canned replies and records every transcript it saw.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
        Self::from_results(replies.into_iter().map(|r| Ok(r.to_string())))
    }

    pub fn from_results(replies: impl IntoIterator<Item = Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the transcripts sent so far.
    pub fn seen(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl Provider for ScriptedModel {
    async fn send(&self, messages: &[Message]) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::api_message("script exhausted")))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }
}
