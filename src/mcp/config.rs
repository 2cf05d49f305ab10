// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP server descriptors.
//!
//! A descriptor is one entry of the `mcp_servers` table in the client
//! configuration. The table key is the server name.
//!
//! # Example Configuration
//!
//! ```yaml
//! mcp_servers:
//!   weather:
//!     transport: sse
//!     url: http://localhost:8000/mcp
//!     default: true
//!   files:
//!     transport: stdio
//!     command: npx
//!     args: ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]
//!     tool_timeout_sec: 60
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::McpError;

/// How to reach a server. Dispatched once, at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport")]
pub enum Transport {
    /// Streamable HTTP / event-stream endpoint.
    #[serde(rename = "sse", alias = "http", alias = "streamable-http")]
    Stream {
        #[serde(default)]
        url: String,
    },

    /// Child process speaking over stdin/stdout.
    #[serde(rename = "stdio")]
    Process {
        #[serde(default, alias = "stdio_command")]
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
}

impl Transport {
    /// Short kind label as written in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stream { .. } => "sse",
            Self::Process { .. } => "stdio",
        }
    }

    /// Human-readable endpoint.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Stream { url } => url.clone(),
            Self::Process { command, args, .. } => {
                std::iter::once(command.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }

    /// Reject endpoints that cannot possibly connect.
    pub fn validate(&self, server: &str) -> Result<(), McpError> {
        match self {
            Self::Stream { url } => {
                let parsed = reqwest::Url::parse(url)
                    .map_err(|e| McpError::connection(server, format!("invalid URL '{}': {}", url, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(McpError::connection(
                        server,
                        format!("unsupported URL scheme '{}'", parsed.scheme()),
                    ));
                }
                Ok(())
            }
            Self::Process { command, .. } => {
                if command.trim().is_empty() {
                    return Err(McpError::connection(server, "stdio transport requires a command"));
                }
                Ok(())
            }
        }
    }
}

/// One configured server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Unique name; the key of the `mcp_servers` table.
    #[serde(skip)]
    pub name: String,

    #[serde(flatten)]
    pub transport: Transport,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Used when an operation names no server.
    #[serde(default, skip_serializing_if = "is_false")]
    pub default: bool,

    /// Bounds the handshake and each discovery step.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_sec: u64,

    /// Bounds each tool call attempt, resource read, and prompt get.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_sec: u64,

    /// Total attempts per tool call.
    #[serde(default = "default_tool_retries")]
    pub tool_retries: u32,

    /// Flat delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Allow-list of tools; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_tools: Vec<String>,

    /// Deny-list of tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_tools: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    300
}

fn default_tool_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ServerDescriptor {
    fn with_transport(name: impl Into<String>, transport: Transport) -> Self {
        Self {
            name: name.into(),
            transport,
            enabled: true,
            default: false,
            startup_timeout_sec: default_startup_timeout(),
            tool_timeout_sec: default_tool_timeout(),
            tool_retries: default_tool_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            enabled_tools: Vec::new(),
            disabled_tools: Vec::new(),
        }
    }

    /// Create a stdio descriptor.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::with_transport(
            name,
            Transport::Process {
                command: command.into(),
                args: Vec::new(),
                env: BTreeMap::new(),
                cwd: None,
            },
        )
    }

    /// Create a streaming HTTP descriptor.
    pub fn stream(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_transport(
            name,
            Transport::Stream { url: url.into() },
        )
    }

    /// Set command arguments (stdio only).
    pub fn with_args(mut self, new_args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        if let Transport::Process { ref mut args, .. } = self.transport {
            *args = new_args.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Set environment variables (stdio only).
    pub fn with_env(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        if let Transport::Process { ref mut env, .. } = self.transport {
            *env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        }
        self
    }

    /// Mark as the default server.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Set the retry policy for tool calls.
    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.tool_retries = attempts;
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_sec)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_sec)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Check if a tool passes the allow/deny lists.
    pub fn is_tool_enabled(&self, tool_name: &str) -> bool {
        if self.disabled_tools.iter().any(|t| t == tool_name) {
            return false;
        }
        self.enabled_tools.is_empty() || self.enabled_tools.iter().any(|t| t == tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptors() {
        let yaml = r#"
transport: stdio
command: npx
args: ["-y", "server-filesystem"]
env:
  NODE_ENV: production
tool_timeout_sec: 60
"#;
        let desc: ServerDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(desc.transport.kind(), "stdio");
        assert_eq!(desc.transport.endpoint(), "npx -y server-filesystem");
        assert_eq!(desc.tool_timeout_sec, 60);
        assert_eq!(desc.startup_timeout_sec, 30);
        assert_eq!(desc.tool_retries, 2);
        assert!(desc.enabled);
        assert!(!desc.default);

        let json = r#"{ "transport": "sse", "url": "http://localhost:8000/sse", "default": true, "enabled": false }"#;
        let desc: ServerDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.transport.kind(), "sse");
        assert!(desc.default);
        assert!(!desc.enabled);
    }

    #[test]
    fn test_transport_aliases() {
        let desc: ServerDescriptor =
            serde_json::from_str(r#"{ "transport": "http", "url": "https://mcp.example.com" }"#).unwrap();
        assert!(matches!(desc.transport, Transport::Stream { .. }));

        let desc: ServerDescriptor =
            serde_json::from_str(r#"{ "transport": "stdio", "stdio_command": "python" }"#).unwrap();
        assert_eq!(desc.transport.endpoint(), "python");
    }

    #[test]
    fn test_validate_endpoints() {
        assert!(ServerDescriptor::stream("a", "http://localhost:8000").transport.validate("a").is_ok());
        assert!(ServerDescriptor::stdio("b", "npx").transport.validate("b").is_ok());

        let err = ServerDescriptor::stream("a", "ftp://host").transport.validate("a").unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }));
        assert!(err.to_string().contains("ftp"));

        let err = ServerDescriptor::stream("a", "not a url").transport.validate("a").unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }));

        let err = ServerDescriptor::stdio("b", "  ").transport.validate("b").unwrap_err();
        assert!(err.to_string().contains("requires a command"));
    }

    #[test]
    fn test_tool_filtering() {
        let mut desc = ServerDescriptor::stdio("s", "cmd");
        assert!(desc.is_tool_enabled("anything"));

        desc.enabled_tools = vec!["read".into(), "write".into()];
        desc.disabled_tools = vec!["write".into()];
        assert!(desc.is_tool_enabled("read"));
        assert!(!desc.is_tool_enabled("write"));
        assert!(!desc.is_tool_enabled("delete"));
    }

    #[test]
    fn test_builders_apply_to_matching_transport() {
        let desc = ServerDescriptor::stdio("s", "cmd")
            .with_args(["--flag"])
            .with_env([("KEY", "value")])
            .as_default()
            .with_retries(3, Duration::from_millis(10));

        assert_eq!(desc.transport.endpoint(), "cmd --flag");
        assert!(desc.default);
        assert_eq!(desc.tool_retries, 3);
        assert_eq!(desc.retry_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_serialize_skips_defaults() {
        let desc = ServerDescriptor::stdio("s", "cmd");
        let yaml = serde_yaml::to_string(&desc).unwrap();
        assert!(yaml.contains("transport: stdio"));
        assert!(!yaml.contains("default:"));
        assert!(!yaml.contains("args"));

        let back: ServerDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.transport, desc.transport);
    }
}
