// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! The client reads one YAML (or JSON) document with three sections:
//! `llm`, `mcp_servers`, and `console`. Every field has a default, so an
//! empty file is a valid configuration.

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::mcp::ServerDescriptor;
use crate::providers::ProviderType;

/// Log levels accepted by `console.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Whole client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub mcp_servers: ServerTable,

    #[serde(default)]
    pub console: ConsoleConfig,
}

impl ClientConfig {
    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm
            .provider
            .parse::<ProviderType>()
            .map_err(|e| ConfigError::invalid("llm.provider", e.to_string()))?;

        let level = self.console.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid(
                "console.log_level",
                format!("'{}' is not one of {}", self.console.log_level, LOG_LEVELS.join(", ")),
            ));
        }

        for descriptor in self.mcp_servers.iter() {
            descriptor
                .transport
                .validate(&descriptor.name)
                .map_err(|e| ConfigError::invalid(format!("mcp_servers.{}", descriptor.name), e.to_string()))?;
        }
        Ok(())
    }
}

/// The `llm` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// openai, ollama, deepseek or openrouter
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Empty means "read the provider's key variable from the environment".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_ms: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The `console` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub prompt: String,
    pub history_file: String,
    pub log_level: String,
    pub max_history: usize,
    /// Tool calls per chat turn.
    pub max_tool_calls: usize,
    pub stream: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "mcp> ".to_string(),
            history_file: "~/.mcp_client_history".to_string(),
            log_level: "info".to_string(),
            max_history: 1000,
            max_tool_calls: 2,
            stream: true,
        }
    }
}

impl ConsoleConfig {
    /// `history_file` with a leading `~` expanded.
    pub fn history_path(&self) -> PathBuf {
        expand_home(&self.history_file)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}

/// The `mcp_servers` table.
///
/// Serialized as a map keyed by server name, held as a list so file order
/// survives a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerTable(Vec<ServerDescriptor>);

impl ServerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServerDescriptor> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|d| d.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.0.iter().find(|d| d.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ServerDescriptor> {
        self.0.iter_mut().find(|d| d.name == name)
    }

    /// Replace in place if the name exists, else append.
    pub fn insert(&mut self, descriptor: ServerDescriptor) {
        match self.get_mut(&descriptor.name) {
            Some(slot) => *slot = descriptor,
            None => self.0.push(descriptor),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ServerDescriptor> {
        let index = self.0.iter().position(|d| d.name == name)?;
        Some(self.0.remove(index))
    }

    pub fn as_slice(&self) -> &[ServerDescriptor] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<ServerDescriptor> {
        self.0.clone()
    }
}

impl From<Vec<ServerDescriptor>> for ServerTable {
    fn from(descriptors: Vec<ServerDescriptor>) -> Self {
        let mut table = Self::new();
        for descriptor in descriptors {
            table.insert(descriptor);
        }
        table
    }
}

impl<'a> IntoIterator for &'a ServerTable {
    type Item = &'a ServerDescriptor;
    type IntoIter = std::slice::Iter<'a, ServerDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for ServerTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for descriptor in &self.0 {
            map.serialize_entry(&descriptor.name, descriptor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServerTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ServerTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of server name to server settings")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ServerTable::new())
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ServerTable::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = ServerTable::new();
                while let Some((name, mut descriptor)) =
                    access.next_entry::<String, ServerDescriptor>()?
                {
                    descriptor.name = name;
                    table.insert(descriptor);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
