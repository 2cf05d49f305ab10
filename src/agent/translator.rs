// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool-call extraction from model replies.
//!
//! Models asked to answer with a JSON tool call do so in several dialects:
//! bare JSON, JSON inside a fenced code block, or a tool name on its own line
//! followed by the argument object. [`parse_reply`] normalizes all of them to
//! a [`ToolIntent`] and classifies everything else as plain text. It never
//! fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::mcp::JsonObject;

/// Fenced code block opening at the start of a line, with its optional label.
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^[ \t]*```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n(.*?)```").unwrap());

/// A request to run one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolIntent {
    pub tool: String,
    pub arguments: JsonObject,
}

/// How the agent should treat a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Conversational answer.
    Text(String),
    /// Tool invocation.
    ToolCall(ToolIntent),
}

impl ModelReply {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall(_))
    }
}

#[derive(Debug)]
enum ParseError {
    NotJson,
    NotObject,
    NoToolField,
}

/// Classify a raw model reply.
pub fn parse_reply(reply: &str) -> ModelReply {
    match parse_tool_intent(reply) {
        Ok(intent) => ModelReply::ToolCall(intent),
        Err(reason) => {
            trace!(?reason, "Reply is not a tool call");
            ModelReply::Text(reply.to_string())
        }
    }
}

fn parse_tool_intent(reply: &str) -> Result<ToolIntent, ParseError> {
    let candidate = extract_payload(reply);
    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(_) => rewrite_named_call(candidate).ok_or(ParseError::NotJson)?,
    };
    intent_from_value(value)
}

/// Inner text of the first `json` block, else of the first unlabeled block,
/// else the whole reply.
fn extract_payload(reply: &str) -> &str {
    let mut unlabeled = None;
    for caps in FENCE.captures_iter(reply) {
        let label = caps.get(1).map_or("", |m| m.as_str());
        let Some(body) = caps.get(2) else { continue };
        if label.eq_ignore_ascii_case("json") {
            return body.as_str().trim();
        }
        if label.is_empty() && unlabeled.is_none() {
            unlabeled = Some(body.as_str());
        }
    }
    unlabeled.unwrap_or(reply).trim()
}

/// `name\n{...}` becomes `{"tool": name, "parameters": {...}}`.
fn rewrite_named_call(candidate: &str) -> Option<Value> {
    let (first, rest) = candidate.split_once('\n')?;
    let name = first.trim();
    if !is_bare_identifier(name) {
        return None;
    }
    let Value::Object(parameters) = serde_json::from_str::<Value>(rest.trim()).ok()? else {
        return None;
    };

    let mut call = Map::new();
    call.insert("tool".to_string(), Value::String(name.to_string()));
    call.insert("parameters".to_string(), Value::Object(parameters));
    Some(Value::Object(call))
}

fn is_bare_identifier(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']' | '"'))
}

fn intent_from_value(value: Value) -> Result<ToolIntent, ParseError> {
    let Value::Object(mut object) = value else {
        return Err(ParseError::NotObject);
    };
    let tool = match object.remove("tool") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => return Err(ParseError::NoToolField),
    };
    let arguments = ["arguments", "parameters"]
        .iter()
        .find_map(|key| match object.remove(*key) {
            Some(Value::Object(args)) => Some(args),
            _ => None,
        })
        .unwrap_or_default();

    Ok(ToolIntent { tool, arguments })
}
