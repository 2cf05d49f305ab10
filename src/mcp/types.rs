// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability types discovered from MCP servers.
//!
//! Servers differ in which optional fields they populate and in whether they
//! spell them `camelCase` (the wire form) or `snake_case`. Each type has one
//! `decode` function that accepts either shape; everything downstream works
//! with the typed values only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object used for tool and prompt arguments.
pub type JsonObject = Map<String, Value>;

/// Read the first string field present under any of `keys`.
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Read the first field present under any of `keys`.
fn any_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k)).filter(|v| !v.is_null())
}

/// Decode a list, skipping entries the item decoder rejects.
pub fn decode_list<T>(value: &Value, key: &str, decode: fn(&Value) -> Option<T>) -> Vec<T> {
    let items = match value {
        Value::Array(items) => Some(items),
        other => other.get(key).and_then(Value::as_array),
    };
    items
        .map(|items| items.iter().filter_map(decode).collect())
        .unwrap_or_default()
}

// ============================================================================
// Tools
// ============================================================================

/// A tool exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, unique within one server.
    pub name: String,
    /// Human description.
    pub description: Option<String>,
    /// JSON Schema describing the arguments.
    pub input_schema: Value,
}

/// One argument derived from a tool's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameter {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

impl Tool {
    /// Create a tool with an empty object schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Set the input schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Decode a tool listing entry.
    pub fn decode(value: &Value) -> Option<Self> {
        Some(Self {
            name: str_field(value, &["name"])?,
            description: str_field(value, &["description"]),
            input_schema: any_field(value, &["inputSchema", "input_schema"])
                .cloned()
                .unwrap_or_else(|| serde_json::json!({ "type": "object" })),
        })
    }

    /// Parameters in schema order with their required flag.
    pub fn parameters(&self) -> Vec<ToolParameter> {
        let required: Vec<&str> = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| ToolParameter {
                        name: name.clone(),
                        description: str_field(prop, &["description"]),
                        required: required.contains(&name.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render the tool for inclusion in a system prompt.
    pub fn format_for_llm(&self) -> String {
        let mut lines = vec![
            format!("Tool: {}", self.name),
            format!(
                "Description: {}",
                self.description.as_deref().unwrap_or("No description")
            ),
            "Arguments:".to_string(),
        ];
        for param in self.parameters() {
            let mut line = format!(
                "- {}: {}",
                param.name,
                param.description.as_deref().unwrap_or("No description")
            );
            if param.required {
                line.push_str(" (required)");
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A concrete resource exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

impl Resource {
    /// Decode a resource listing entry. The name falls back to the URI.
    pub fn decode(value: &Value) -> Option<Self> {
        let uri = str_field(value, &["uri"])?;
        Some(Self {
            name: str_field(value, &["name"]).unwrap_or_else(|| uri.clone()),
            mime_type: str_field(value, &["mimeType", "mime_type"]),
            description: str_field(value, &["description"]),
            uri,
        })
    }
}

/// A parameterized resource exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub uri_template: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

impl ResourceTemplate {
    /// Decode a resource template listing entry.
    pub fn decode(value: &Value) -> Option<Self> {
        let uri_template = str_field(value, &["uriTemplate", "uri_template"])?;
        Some(Self {
            name: str_field(value, &["name"]).unwrap_or_else(|| uri_template.clone()),
            mime_type: str_field(value, &["mimeType", "mime_type"]),
            description: str_field(value, &["description"]),
            uri_template,
        })
    }
}

/// One entry of a resource read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub text: Option<String>,
    /// Base64 payload for binary resources.
    pub blob: Option<String>,
}

/// Result of reading a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    pub contents: Vec<ResourceContent>,
}

impl ResourceContents {
    /// Single text entry.
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            contents: vec![ResourceContent {
                uri: Some(uri.into()),
                mime_type: Some("text/plain".to_string()),
                text: Some(text.into()),
                blob: None,
            }],
        }
    }

    /// Decode a read-resource result.
    pub fn decode(value: &Value) -> Self {
        let contents = decode_list(value, "contents", |item| {
            Some(ResourceContent {
                uri: str_field(item, &["uri"]),
                mime_type: str_field(item, &["mimeType", "mime_type"]),
                text: str_field(item, &["text"]),
                blob: str_field(item, &["blob"]),
            })
        });
        Self { contents }
    }

    /// Text entries joined; binary entries are summarized.
    pub fn as_text(&self) -> String {
        self.contents
            .iter()
            .map(|c| match (&c.text, &c.blob) {
                (Some(text), _) => text.clone(),
                (None, Some(blob)) => format!(
                    "[binary {} ({} bytes base64)]",
                    c.mime_type.as_deref().unwrap_or("data"),
                    blob.len()
                ),
                (None, None) => String::new(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Prompts
// ============================================================================

/// An argument accepted by a prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

/// A server-side prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<PromptArgument>,
}

impl Prompt {
    /// Decode a prompt listing entry.
    ///
    /// Accepts either an `arguments` list or an `inputSchema` object.
    pub fn decode(value: &Value) -> Option<Self> {
        let name = str_field(value, &["name"])?;
        let mut arguments = decode_list(value, "arguments", |arg| {
            Some(PromptArgument {
                name: str_field(arg, &["name"])?,
                description: str_field(arg, &["description"]),
                required: arg.get("required").and_then(Value::as_bool).unwrap_or(false),
            })
        });
        if arguments.is_empty() {
            if let Some(schema) = any_field(value, &["inputSchema", "input_schema"]) {
                let as_tool = Tool {
                    name: name.clone(),
                    description: None,
                    input_schema: schema.clone(),
                };
                arguments = as_tool
                    .parameters()
                    .into_iter()
                    .map(|p| PromptArgument {
                        name: p.name,
                        description: p.description,
                        required: p.required,
                    })
                    .collect();
            }
        }
        Some(Self {
            name,
            description: str_field(value, &["description"]),
            arguments,
        })
    }
}

/// A rendering format a server offers for its prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFormat {
    pub name: String,
    pub description: Option<String>,
    pub schema: Option<Value>,
}

impl PromptFormat {
    /// Decode a prompt format listing entry.
    pub fn decode(value: &Value) -> Option<Self> {
        Some(Self {
            name: str_field(value, &["name"])?,
            description: str_field(value, &["description"]),
            schema: any_field(value, &["schema", "inputSchema"]).cloned(),
        })
    }
}

/// One message of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub text: String,
}

/// Result of rendering a prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptContent {
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

impl PromptContent {
    /// Decode a get-prompt result.
    pub fn decode(value: &Value) -> Self {
        let messages = decode_list(value, "messages", |msg| {
            let role = str_field(msg, &["role"]).unwrap_or_else(|| "user".to_string());
            let text = match msg.get("content") {
                Some(Value::String(s)) => s.clone(),
                Some(content) => Content::decode(content).as_text(),
                None => return None,
            };
            Some(PromptMessage { role, text })
        });
        Self {
            description: str_field(value, &["description"]),
            messages,
        }
    }

    /// Messages rendered as `role: text` lines.
    pub fn as_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Tool results
// ============================================================================

/// Content blocks returned by tool calls and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    Text(String),
    Image { mime_type: String, data: String },
    Resource { uri: String, text: Option<String> },
    Other(Value),
}

impl Content {
    /// Decode a single content block.
    pub fn decode(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("text") => Self::Text(str_field(value, &["text"]).unwrap_or_default()),
            Some("image") => Self::Image {
                mime_type: str_field(value, &["mimeType", "mime_type"])
                    .unwrap_or_else(|| "image".to_string()),
                data: str_field(value, &["data"]).unwrap_or_default(),
            },
            Some("resource") => {
                let inner = value.get("resource").unwrap_or(value);
                Self::Resource {
                    uri: str_field(inner, &["uri"]).unwrap_or_default(),
                    text: str_field(inner, &["text"]),
                }
            }
            _ => match str_field(value, &["text"]) {
                Some(text) => Self::Text(text),
                None => Self::Other(value.clone()),
            },
        }
    }

    /// Render as plain text.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Image { mime_type, data } => {
                format!("[image {} ({} bytes base64)]", mime_type, data.len())
            }
            Self::Resource { uri, text } => match text {
                Some(text) => text.clone(),
                None => format!("[resource {}]", uri),
            },
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Result of a tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<Content>,
    /// The server reported the call as failed.
    pub is_error: bool,
    /// Structured payload, when the server sends one.
    pub structured: Option<Value>,
}

impl ToolOutput {
    /// Successful text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text(text.into())],
            ..Default::default()
        }
    }

    /// Server-reported error result.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text(text.into())],
            is_error: true,
            structured: None,
        }
    }

    /// Decode a call-tool result.
    pub fn decode(value: &Value) -> Self {
        let content = match value.get("content") {
            Some(Value::Array(items)) => items.iter().map(Content::decode).collect(),
            Some(Value::String(s)) => vec![Content::Text(s.clone())],
            _ => Vec::new(),
        };
        Self {
            content,
            is_error: any_field(value, &["isError", "is_error"])
                .and_then(Value::as_bool)
                .unwrap_or(false),
            structured: any_field(value, &["structuredContent", "structured_content"]).cloned(),
        }
    }

    /// Text content joined by newlines, falling back to the structured payload.
    pub fn as_text(&self) -> String {
        if self.content.is_empty() {
            return self
                .structured
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default();
        }
        self.content
            .iter()
            .map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Server identity and state
// ============================================================================

/// Identity reported during the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub protocol_version: Option<String>,
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: "0.0.0".to_string(),
            protocol_version: None,
        }
    }
}

impl ServerIdentity {
    /// Decode an initialize result.
    pub fn decode(value: &Value) -> Self {
        let info = any_field(value, &["serverInfo", "server_info"]).unwrap_or(value);
        let fallback = Self::default();
        Self {
            name: str_field(info, &["name"]).unwrap_or(fallback.name),
            version: str_field(info, &["version"]).unwrap_or(fallback.version),
            protocol_version: str_field(value, &["protocolVersion", "protocol_version"]),
        }
    }
}

/// Connection state of one server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_decode_wire_and_snake_case() {
        let wire = json!({
            "name": "get_weather",
            "description": "Current weather",
            "inputSchema": { "type": "object", "properties": { "city": { "type": "string" } } }
        });
        let tool = Tool::decode(&wire).unwrap();
        assert_eq!(tool.name, "get_weather");
        assert!(tool.input_schema["properties"]["city"].is_object());

        let snake = json!({ "name": "t", "input_schema": { "type": "object" } });
        let tool = Tool::decode(&snake).unwrap();
        assert_eq!(tool.description, None);
        assert_eq!(tool.input_schema["type"], "object");
    }

    #[test]
    fn test_decode_list_skips_nameless_entries() {
        let listing = json!({ "tools": [ { "name": "a" }, { "description": "no name" }, { "name": "b" } ] });
        let tools = decode_list(&listing, "tools", Tool::decode);
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_format_for_llm() {
        let tool = Tool::new("get_weather", "Current weather").with_schema(json!({
            "type": "object",
            "properties": {
                "city": { "type": "string", "description": "City name" },
                "units": { "type": "string" }
            },
            "required": ["city"]
        }));
        let text = tool.format_for_llm();
        assert!(text.starts_with("Tool: get_weather\nDescription: Current weather\nArguments:"));
        assert!(text.contains("- city: City name (required)"));
        assert!(text.contains("- units: No description"));
        assert!(!text.contains("units: No description (required)"));
    }

    #[test]
    fn test_resource_decoding() {
        let res = Resource::decode(&json!({ "uri": "file:///a.txt", "mimeType": "text/plain" })).unwrap();
        assert_eq!(res.name, "file:///a.txt");
        assert_eq!(res.mime_type.as_deref(), Some("text/plain"));

        let tpl = ResourceTemplate::decode(&json!({ "uri_template": "file:///{path}", "name": "files" })).unwrap();
        assert_eq!(tpl.uri_template, "file:///{path}");

        assert!(Resource::decode(&json!({ "name": "no uri" })).is_none());
    }

    #[test]
    fn test_prompt_decode_from_arguments_or_schema() {
        let prompt = Prompt::decode(&json!({
            "name": "summarize",
            "arguments": [ { "name": "text", "required": true } ]
        }))
        .unwrap();
        assert_eq!(prompt.arguments.len(), 1);
        assert!(prompt.arguments[0].required);

        let prompt = Prompt::decode(&json!({
            "name": "greet",
            "inputSchema": { "properties": { "who": {} }, "required": ["who"] }
        }))
        .unwrap();
        assert_eq!(prompt.arguments[0].name, "who");
        assert!(prompt.arguments[0].required);
    }

    #[test]
    fn test_tool_output_decode() {
        let output = ToolOutput::decode(&json!({
            "content": [ { "type": "text", "text": "72F" }, { "type": "image", "mimeType": "image/png", "data": "AAAA" } ],
            "isError": false
        }));
        assert!(!output.is_error);
        let text = output.as_text();
        assert!(text.starts_with("72F\n[image image/png"));

        let structured = ToolOutput::decode(&json!({ "content": [], "structuredContent": { "t": 1 } }));
        assert_eq!(structured.as_text(), r#"{"t":1}"#);

        let failed = ToolOutput::decode(&json!({ "content": [ { "type": "text", "text": "bad" } ], "isError": true }));
        assert!(failed.is_error);
    }

    #[test]
    fn test_resource_contents_and_prompt_content() {
        let contents = ResourceContents::decode(&json!({
            "contents": [ { "uri": "mem://a", "text": "hello" }, { "uri": "mem://b", "blob": "AAAA", "mimeType": "image/png" } ]
        }));
        assert_eq!(contents.contents.len(), 2);
        assert!(contents.as_text().starts_with("hello\n[binary image/png"));

        let prompt = PromptContent::decode(&json!({
            "description": "d",
            "messages": [ { "role": "user", "content": { "type": "text", "text": "Hi" } } ]
        }));
        assert_eq!(prompt.as_text(), "user: Hi");
    }

    #[test]
    fn test_identity_and_state() {
        let id = ServerIdentity::decode(&json!({
            "protocolVersion": "2025-03-26",
            "serverInfo": { "name": "weather", "version": "1.2.0" }
        }));
        assert_eq!(id.name, "weather");
        assert_eq!(id.protocol_version.as_deref(), Some("2025-03-26"));
        assert_eq!(ServerIdentity::decode(&json!(null)).name, "unknown");

        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
