// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Console command parsing.
//!
//! Parsing is pure so every command shape can be tested without a terminal
//! or a server.

use serde_json::Value;

use crate::mcp::{JsonObject, ServerDescriptor};

/// One console command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Connect(Option<String>),
    Disconnect(Option<String>),
    Servers,
    Tools(Option<String>),
    Resources(Option<String>),
    Prompts(Option<String>),
    Read {
        uri: String,
        server: Option<String>,
    },
    Prompt {
        name: String,
        arguments: JsonObject,
    },
    Execute {
        server: Option<String>,
        tool: String,
        arguments: JsonObject,
    },
    Chat,
    ConfigShow,
    ConfigLlm(LlmUpdate),
    ConfigAddServer(ServerDescriptor),
    ConfigRemoveServer(String),
    Reload,
    Metrics,
    Exit,
}

/// Fields changed by `config llm`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmUpdate {
    pub provider: String,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
}

/// Help text, one line per command.
pub const HELP: &[(&str, &str)] = &[
    ("help", "Show this help"),
    ("servers", "List servers with transport, state and tool count"),
    ("connect [server]", "Connect to a server (default server if omitted)"),
    ("disconnect [server]", "Disconnect from a server (default server if omitted)"),
    ("tools [server]", "List tools"),
    ("resources [server]", "List resources and resource templates"),
    ("prompts [server]", "List prompts"),
    ("read <uri> [server]", "Read a resource"),
    ("prompt <name> [key=value ...]", "Render a prompt"),
    ("execute [server] <tool> [key=value ...]", "Run a tool (default server if omitted)"),
    ("chat", "Chat with the model using the connected tools"),
    ("config [show]", "Show the configuration"),
    ("config llm <provider> [model=..] [api_base=..] [api_key=..]", "Change the model provider"),
    ("config add-server <name> stdio <command> [args..]", "Add a process server"),
    ("config add-server <name> sse <url>", "Add an HTTP server"),
    ("config remove-server <name>", "Remove a server"),
    ("reload", "Re-read the config file and reconnect"),
    ("metrics", "Show call counts and latencies"),
    ("exit", "Disconnect everything and quit"),
];

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let words = split_words(line)?;
    let Some((head, rest)) = words.split_first() else {
        return Ok(None);
    };

    let command = match head.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "exit" | "quit" => Command::Exit,
        "servers" => Command::Servers,
        "chat" => Command::Chat,
        "reload" => Command::Reload,
        "metrics" => Command::Metrics,
        "connect" => Command::Connect(optional_arg(rest, "connect [server]")?),
        "disconnect" => Command::Disconnect(optional_arg(rest, "disconnect [server]")?),
        "tools" => Command::Tools(optional_arg(rest, "tools [server]")?),
        "resources" => Command::Resources(optional_arg(rest, "resources [server]")?),
        "prompts" => Command::Prompts(optional_arg(rest, "prompts [server]")?),
        "read" => match rest {
            [uri] => Command::Read {
                uri: uri.clone(),
                server: None,
            },
            [uri, server] => Command::Read {
                uri: uri.clone(),
                server: Some(server.clone()),
            },
            _ => return Err(usage("read <uri> [server]")),
        },
        "prompt" => {
            let (name, pairs) = rest
                .split_first()
                .ok_or_else(|| usage("prompt <name> [key=value ...]"))?;
            Command::Prompt {
                name: name.clone(),
                arguments: parse_key_values(pairs, false)?,
            }
        }
        "execute" | "exec" | "call" => match rest {
            // A second word without `=` is the tool, so the first names the server.
            [server, tool, pairs @ ..] if !tool.contains('=') => Command::Execute {
                server: Some(server.clone()),
                tool: tool.clone(),
                arguments: parse_key_values(pairs, true)?,
            },
            [tool, pairs @ ..] => Command::Execute {
                server: None,
                tool: tool.clone(),
                arguments: parse_key_values(pairs, true)?,
            },
            [] => return Err(usage("execute [server] <tool> [key=value ...]")),
        },
        "config" => parse_config(rest)?,
        other => return Err(format!("Unknown command '{}'. Type 'help' for commands.", other)),
    };
    Ok(Some(command))
}

fn parse_config(rest: &[String]) -> Result<Command, String> {
    let Some((action, args)) = rest.split_first() else {
        return Ok(Command::ConfigShow);
    };

    match action.as_str() {
        "show" => Ok(Command::ConfigShow),
        "llm" => {
            let (provider, pairs) = args
                .split_first()
                .ok_or_else(|| usage("config llm <provider> [model=..] [api_base=..] [api_key=..]"))?;
            let mut update = LlmUpdate {
                provider: provider.clone(),
                ..Default::default()
            };
            for pair in pairs {
                let (key, value) = split_pair(pair)?;
                let slot = match key {
                    "model" => &mut update.model,
                    "api_base" | "base_url" => &mut update.api_base,
                    "api_key" => &mut update.api_key,
                    other => return Err(format!("Unknown llm setting '{}'", other)),
                };
                *slot = Some(value.to_string());
            }
            Ok(Command::ConfigLlm(update))
        }
        "add-server" => match args {
            [name, kind, command, extra @ ..] if kind == "stdio" => Ok(Command::ConfigAddServer(
                ServerDescriptor::stdio(name.clone(), command.clone()).with_args(extra.iter().cloned()),
            )),
            [name, kind, url] if matches!(kind.as_str(), "sse" | "http") => Ok(
                Command::ConfigAddServer(ServerDescriptor::stream(name.clone(), url.clone())),
            ),
            _ => Err(usage("config add-server <name> stdio <command> [args..] | sse <url>")),
        },
        "remove-server" => Ok(Command::ConfigRemoveServer(one_arg(
            args,
            "config remove-server <name>",
        )?)),
        other => Err(format!("Unknown config action '{}'", other)),
    }
}

fn usage(text: &str) -> String {
    format!("Usage: {}", text)
}

fn one_arg(rest: &[String], text: &str) -> Result<String, String> {
    match rest {
        [arg] => Ok(arg.clone()),
        _ => Err(usage(text)),
    }
}

fn optional_arg(rest: &[String], text: &str) -> Result<Option<String>, String> {
    match rest {
        [] => Ok(None),
        [arg] => Ok(Some(arg.clone())),
        _ => Err(usage(text)),
    }
}

fn split_pair(pair: &str) -> Result<(&str, &str), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(format!("Expected key=value, got '{}'", pair)),
    }
}

/// Build an argument object from `key=value` words.
///
/// With `coerce`, values are typed by [`coerce_value`]; otherwise they stay
/// strings (prompt arguments are always strings).
pub fn parse_key_values(pairs: &[String], coerce: bool) -> Result<JsonObject, String> {
    let mut arguments = JsonObject::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        let value = if coerce {
            coerce_value(value)
        } else {
            Value::String(value.to_string())
        };
        arguments.insert(key.to_string(), value);
    }
    Ok(arguments)
}

/// Type a console argument: booleans, integers, floats, JSON objects and
/// arrays; anything else is a string.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Split on whitespace, honoring single and double quotes.
///
/// A quote opens only at the start of a word or right after `=`, so JSON
/// values such as `tags=["a","b"]` pass through untouched.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) if c == '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push(c),
            },
            Some(_) => current.push(c),
            None if (c == '"' || c == '\'') && (!in_word || current.ends_with('=')) => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
