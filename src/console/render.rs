// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Text rendering for console output.

use colored::Colorize;

use crate::mcp::{ConnectionState, Prompt, Resource, ResourceTemplate, ServerStatus, Tool, ToolOutput};

use super::commands::HELP;

/// Longest tool result echoed during chat.
pub const MAX_RESULT_CHARS: usize = 500;

pub fn format_help() -> String {
    let width = HELP.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    let mut out = format!("{}\n", "Commands:".bold());
    for (usage, description) in HELP {
        let usage = format!("{:width$}", usage, width = width);
        out.push_str(&format!("  {}  {}\n", usage.cyan(), description));
    }
    out
}

pub fn format_servers(statuses: &[ServerStatus]) -> String {
    if statuses.is_empty() {
        return "No servers configured. Use 'config add-server' to add one.\n".dimmed().to_string();
    }

    let mut out = String::new();
    for status in statuses {
        let state = match status.state {
            ConnectionState::Connected => status.state.to_string().green(),
            ConnectionState::Connecting => status.state.to_string().yellow(),
            ConnectionState::Failed => status.state.to_string().red(),
            ConnectionState::Disconnected => status.state.to_string().dimmed(),
        };
        let mut flags = Vec::new();
        if status.default {
            flags.push("default");
        }
        if !status.enabled {
            flags.push("disabled");
        }

        out.push_str(&format!(
            "  {} [{}] {} - {} tools{}\n",
            status.name.bold(),
            status.transport,
            state,
            status.tool_count,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        ));
        out.push_str(&format!("      {}\n", status.endpoint.dimmed()));
        if let Some(identity) = &status.identity {
            out.push_str(&format!("      server: {} {}\n", identity.name, identity.version));
        }
        if let Some(error) = &status.last_error {
            out.push_str(&format!("      {} {}\n", "last error:".red(), error));
        }
    }
    out
}

pub fn format_tools(tools: &[(String, Tool)]) -> String {
    if tools.is_empty() {
        return "No tools available.\n".dimmed().to_string();
    }

    let mut out = String::new();
    for (server, tool) in tools {
        out.push_str(&format!("  {} {}\n", tool.name.bold(), format!("({})", server).dimmed()));
        if let Some(description) = &tool.description {
            out.push_str(&format!("      {}\n", description));
        }
        for param in tool.parameters() {
            out.push_str(&format!(
                "      - {}{}{}\n",
                param.name.cyan(),
                if param.required { " (required)" } else { "" },
                param
                    .description
                    .as_deref()
                    .map(|d| format!(": {}", d))
                    .unwrap_or_default()
            ));
        }
    }
    out
}

pub fn format_resources(resources: &[(String, Resource)], templates: &[(String, ResourceTemplate)]) -> String {
    if resources.is_empty() && templates.is_empty() {
        return "No resources available.\n".dimmed().to_string();
    }

    let mut out = String::new();
    for (server, resource) in resources {
        out.push_str(&format!(
            "  {} {} {}\n",
            resource.uri.bold(),
            resource.name,
            format!("({})", server).dimmed()
        ));
        if let Some(description) = &resource.description {
            out.push_str(&format!("      {}\n", description));
        }
    }
    if !templates.is_empty() {
        out.push_str(&format!("{}\n", "Templates:".bold()));
        for (server, template) in templates {
            out.push_str(&format!(
                "  {} {} {}\n",
                template.uri_template.bold(),
                template.name,
                format!("({})", server).dimmed()
            ));
        }
    }
    out
}

pub fn format_prompts(prompts: &[(String, Prompt)]) -> String {
    if prompts.is_empty() {
        return "No prompts available.\n".dimmed().to_string();
    }

    let mut out = String::new();
    for (server, prompt) in prompts {
        out.push_str(&format!("  {} {}\n", prompt.name.bold(), format!("({})", server).dimmed()));
        if let Some(description) = &prompt.description {
            out.push_str(&format!("      {}\n", description));
        }
        for arg in &prompt.arguments {
            out.push_str(&format!(
                "      - {}{}\n",
                arg.name.cyan(),
                if arg.required { " (required)" } else { "" }
            ));
        }
    }
    out
}

/// Tool output as text, pretty-printed when it is JSON.
pub fn format_tool_output(output: &ToolOutput) -> String {
    pretty_json(&output.as_text())
}

pub fn pretty_json(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .filter(|v| v.is_object() || v.is_array())
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Cut `text` to `max` characters, noting how much was dropped.
pub fn truncate(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max).collect();
    format!("{}... [{} more chars]", kept, total - max)
}

/// Decides which streamed text reaches the terminal.
///
/// Replies that open like a tool call (`{` or a code fence) are held back:
/// a tool call is discarded, anything else is printed whole once the reply
/// is final. Everything else streams as it arrives.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    buffer: String,
    mode: StreamMode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum StreamMode {
    #[default]
    Pending,
    Streaming,
    Held,
}

impl StreamPrinter {
    /// Feed a delta; returns text to print now.
    pub fn push(&mut self, delta: &str) -> Option<String> {
        self.buffer.push_str(delta);
        match self.mode {
            StreamMode::Streaming => Some(delta.to_string()),
            StreamMode::Held => None,
            StreamMode::Pending => {
                let head = self.buffer.trim_start();
                if head.is_empty() {
                    None
                } else if head.starts_with('{') || head.starts_with('`') {
                    self.mode = StreamMode::Held;
                    None
                } else {
                    self.mode = StreamMode::Streaming;
                    Some(head.to_string())
                }
            }
        }
    }

    /// Whether the current reply is already on screen.
    pub fn started(&self) -> bool {
        self.mode == StreamMode::Streaming
    }

    /// The reply is final; returns whatever has not been shown yet.
    pub fn finish(&mut self, reply: &str) -> Option<String> {
        let streamed = self.mode == StreamMode::Streaming;
        self.reset();
        (!streamed).then(|| reply.trim().to_string())
    }

    /// Drop buffered text (the reply was a tool call).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.mode = StreamMode::Pending;
    }
}
