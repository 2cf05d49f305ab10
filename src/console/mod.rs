// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interactive command console.
//!
//! A shell-style REPL: one command per line, output scrolls normally, and
//! `chat` hands the same line editor to the agent loop until the user leaves.

mod commands;
mod input;
mod render;

pub use commands::{coerce_value, parse_command, parse_key_values, split_words, Command, LlmUpdate, HELP};
pub use input::{ChatInput, LineEvent, LineReader};
pub use render::{
    format_help, format_prompts, format_resources, format_servers, format_tool_output, format_tools,
    pretty_json, truncate, StreamPrinter, MAX_RESULT_CHARS,
};

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use colored::Colorize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions, RunEnd};
use crate::config::{ClientConfig, CliOptions, ConfigFile, EnvOverrides, LlmConfig};
use crate::mcp::{JsonObject, McpError, McpToolAdapter, ServerManager, SessionConnector, ToolInvoker};
use crate::providers::{create_provider_from_config, ProviderType};
use crate::telemetry::GLOBAL_METRICS;

/// Which servers to connect when the console starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectMode {
    /// Every enabled server.
    #[default]
    Enabled,
    /// Only these, enabled or not.
    Only(Vec<String>),
    /// Nothing; the user connects by hand.
    Skip,
}

enum Flow {
    Continue,
    Exit,
}

/// Console state for one session.
pub struct Console {
    config_file: Arc<ConfigFile>,
    /// Merged view of file, environment and CLI.
    config: ClientConfig,
    env: EnvOverrides,
    cli: CliOptions,
    manager: Arc<ServerManager>,
    reader: LineReader,
}

impl Console {
    /// Build the console and its server manager. Server add/remove is
    /// persisted through `config_file`.
    pub fn new(
        config_file: Arc<ConfigFile>,
        env: EnvOverrides,
        cli: CliOptions,
        connector: Arc<dyn SessionConnector>,
    ) -> io::Result<Self> {
        let config = config_file.resolve(&env, &cli);
        let manager = ServerManager::with_servers(connector, config.mcp_servers.to_vec())
            .with_store(config_file.clone());
        let reader = LineReader::spawn(Some(config.console.history_path()), config.console.max_history)?;
        Ok(Self {
            config_file,
            config,
            env,
            cli,
            manager: Arc::new(manager),
            reader,
        })
    }

    pub fn manager(&self) -> &Arc<ServerManager> {
        &self.manager
    }

    /// Connect servers per `mode`, reporting failures without stopping.
    pub async fn connect_on_start(&self, mode: &ConnectMode) {
        let failures = match mode {
            ConnectMode::Enabled => self.manager.connect_enabled().await,
            ConnectMode::Only(names) => {
                let mut failures = Vec::new();
                for name in names {
                    if let Err(e) = self.manager.connect_server(name).await {
                        failures.push((name.clone(), e));
                    }
                }
                failures
            }
            ConnectMode::Skip => Vec::new(),
        };
        for (name, error) in failures {
            println!("{} {}: {}", "⚠ Could not connect".yellow(), name.bold(), error);
        }

        let connected = self.manager.get_connected_servers().await.len();
        if connected > 0 {
            println!(
                "{}",
                format!("Connected to {} server(s), {} tool(s) available.", connected, self.manager.all_tools().await.len())
                    .dimmed()
            );
        }
    }

    /// Run the REPL until `exit` or end of input.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.print_welcome();

        loop {
            let line = match self.reader.read_line(&self.config.console.prompt).await {
                LineEvent::Line(line) => line,
                LineEvent::Interrupted => continue,
                LineEvent::Eof => break,
                LineEvent::Error(e) => {
                    eprintln!("{} {}", "Input error:".red(), e);
                    break;
                }
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    eprintln!("{}", message.red());
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => eprintln!("{} {:#}", "Error:".red().bold(), e),
            }
        }

        self.shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    async fn shutdown(&self) {
        for (name, error) in self.manager.disconnect_all().await {
            debug!(server = %name, error = %error, "Disconnect on exit failed");
        }
    }

    fn print_welcome(&self) {
        println!("{}", format!("mcpsh {}", crate::VERSION).cyan().bold());
        println!(
            "{} {}",
            "Config:".dimmed(),
            if self.config_file.exists() {
                self.config_file.path().display().to_string()
            } else {
                format!("{} (not created yet)", self.config_file.path().display())
            }
        );
        println!("{} {}", "Model:".dimmed(), describe_llm(&self.config.llm));
        println!("Type 'help' for commands.");
        println!();
    }

    async fn execute(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Help => print!("{}", format_help()),
            Command::Exit => return Ok(Flow::Exit),
            Command::Servers => print!("{}", format_servers(&self.manager.statuses().await)),
            Command::Connect(name) => {
                let name = self.manager.resolve_server_name(name.as_deref()).await?;
                self.manager.connect_server(&name).await?;
                let tools = match self.manager.server(&name).await {
                    Some(server) => server.tools().await.len(),
                    None => 0,
                };
                println!("{} {} ({} tools)", "✓ Connected to".green(), name.bold(), tools);
            }
            Command::Disconnect(name) => {
                let name = self.manager.resolve_server_name(name.as_deref()).await?;
                self.manager.disconnect_server(&name).await?;
                println!("Disconnected from {}", name.bold());
            }
            Command::Tools(server) => {
                self.check_server(server.as_deref()).await?;
                let tools = only_server(self.manager.all_tools().await, server.as_deref());
                print!("{}", format_tools(&tools));
            }
            Command::Resources(server) => {
                self.check_server(server.as_deref()).await?;
                let resources = only_server(self.manager.all_resources().await, server.as_deref());
                let templates = only_server(self.manager.all_resource_templates().await, server.as_deref());
                print!("{}", format_resources(&resources, &templates));
            }
            Command::Prompts(server) => {
                self.check_server(server.as_deref()).await?;
                let prompts = only_server(self.manager.all_prompts().await, server.as_deref());
                print!("{}", format_prompts(&prompts));
            }
            Command::Read { uri, server } => {
                let contents = self.manager.get_resource(&uri, server.as_deref()).await?;
                println!("{}", pretty_json(&contents.as_text()));
            }
            Command::Prompt { name, arguments } => {
                let content = self.manager.get_prompt(&name, arguments, None, None).await?;
                println!("{}", content.as_text());
            }
            Command::Execute { server, tool, arguments } => {
                let server = self.manager.resolve_server_name(server.as_deref()).await?;
                let output = self.manager.execute_tool(&tool, arguments, Some(&server)).await?;
                if output.is_error {
                    println!("{}", "✗ Tool reported an error:".red());
                } else {
                    println!("{}", "✓ Result:".green());
                }
                println!("{}", format_tool_output(&output));
            }
            Command::Chat => self.chat().await?,
            Command::ConfigShow => print!("{}", self.describe_config()?),
            Command::ConfigLlm(update) => self.configure_llm(update)?,
            Command::ConfigAddServer(descriptor) => {
                let name = descriptor.name.clone();
                self.manager.add_server(descriptor).await?;
                self.refresh_config();
                println!("Added server {}. Use 'connect {}' to start it.", name.bold(), name);
            }
            Command::ConfigRemoveServer(name) => {
                self.manager.remove_server(&name).await?;
                self.refresh_config();
                println!("Removed server {}", name.bold());
            }
            Command::Reload => self.reload().await?,
            Command::Metrics => {
                let snapshot = GLOBAL_METRICS.snapshot();
                if snapshot.is_empty() {
                    println!("{}", "No calls recorded yet.".dimmed());
                } else {
                    print!("{}", snapshot.format_report());
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn check_server(&self, server: Option<&str>) -> Result<(), McpError> {
        match server {
            Some(name) if self.manager.server(name).await.is_none() => {
                Err(McpError::ServerNotFound(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn describe_config(&self) -> Result<String, serde_yaml::Error> {
        render_config(self.config_file.path(), &self.config)
    }

    fn refresh_config(&mut self) {
        self.config = self.config_file.resolve(&self.env, &self.cli);
    }

    /// `config llm`: persist the change and let it win over environment and
    /// CLI overrides for the rest of the session.
    fn configure_llm(&mut self, update: LlmUpdate) -> anyhow::Result<()> {
        let provider: ProviderType = update.provider.parse()?;
        self.config_file
            .update(|config| apply_llm_update(&mut config.llm, provider, update))?;

        self.env.provider = None;
        self.env.model = None;
        self.env.api_key = None;
        self.env.api_base = None;
        self.cli.provider = None;
        self.cli.model = None;
        self.cli.api_key = None;
        self.cli.api_base = None;
        self.refresh_config();

        println!("{} {}", "LLM set to".green(), describe_llm(&self.config.llm));
        if let Err(e) = create_provider_from_config(&self.config.llm) {
            println!("{} {}", "⚠".yellow(), e);
        }
        Ok(())
    }

    /// Re-read the file, then swap the server set and reconnect.
    async fn reload(&mut self) -> anyhow::Result<()> {
        self.config_file.reload()?;
        let resolved = self.config_file.resolve(&self.env, &self.cli);
        resolved.validate()?;

        if let Err(e) = create_provider_from_config(&resolved.llm) {
            println!("{} {}", "⚠ LLM provider not ready:".yellow(), e);
        }

        for (name, error) in self.manager.replace_servers(resolved.mcp_servers.to_vec()).await {
            warn!(server = %name, error = %error, "Disconnect during reload failed");
        }
        self.config = resolved;
        println!("Reloaded {}", self.config_file.path().display());

        self.connect_on_start(&ConnectMode::Enabled).await;
        Ok(())
    }

    async fn chat(&mut self) -> anyhow::Result<()> {
        let provider = create_provider_from_config(&self.config.llm)?;
        let tools: Arc<dyn ToolInvoker> = Arc::new(McpToolAdapter::new(self.manager.clone()));
        if tools.list_available_tools().await.is_empty() {
            println!("{}", "⚠ No tools available; the model will answer on its own.".yellow());
        }

        let mut agent = Agent::new(AgentOptions {
            provider,
            tools,
            system_prompt: None,
            config: AgentConfig {
                max_tool_calls: self.config.console.max_tool_calls,
                stream: self.config.console.stream,
                ..Default::default()
            },
            callbacks: chat_callbacks(),
        });

        println!(
            "{} {}/{}. Type 'exit' or press Ctrl-C to leave.",
            "Chatting with".cyan(),
            agent.provider_name(),
            agent.model()
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });

        let mut input = self.reader.chat_input("you> ");
        let end = agent.run(&mut input, cancel_rx).await;
        watcher.abort();

        match end {
            RunEnd::Cancelled => println!("\n{}", "Chat cancelled.".dimmed()),
            RunEnd::Exit | RunEnd::EndOfInput => println!("{}", "Left chat mode.".dimmed()),
        }
        Ok(())
    }
}

/// Keep entries owned by `server`, or all of them.
fn only_server<T>(items: Vec<(String, T)>, server: Option<&str>) -> Vec<(String, T)> {
    match server {
        Some(name) => items.into_iter().filter(|(owner, _)| owner == name).collect(),
        None => items,
    }
}

/// `provider/model`, with the provider's default model when none is set.
pub fn describe_llm(llm: &LlmConfig) -> String {
    let model = match (&llm.model, llm.provider.parse::<ProviderType>()) {
        (Some(model), _) => model.clone(),
        (None, Ok(provider)) => provider.default_model().to_string(),
        (None, Err(_)) => "?".to_string(),
    };
    format!("{}/{}", llm.provider, model)
}

/// Apply `config llm`. Switching provider drops the old provider's model,
/// base URL and key unless the update sets them.
pub fn apply_llm_update(llm: &mut LlmConfig, provider: ProviderType, update: LlmUpdate) {
    if llm.provider.parse::<ProviderType>().ok() != Some(provider) {
        llm.model = None;
        llm.api_base = None;
        llm.api_key = None;
    }
    llm.provider = provider.to_string();
    if update.model.is_some() {
        llm.model = update.model;
    }
    if update.api_base.is_some() {
        llm.api_base = update.api_base;
    }
    if update.api_key.is_some() {
        llm.api_key = update.api_key;
    }
}

/// YAML of `config` with secrets masked, headed by the file it belongs to.
pub fn render_config(path: &Path, config: &ClientConfig) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(&masked(config))?;
    Ok(format!("# {}\n{}", path.display(), yaml))
}

/// Copy of `config` safe to print.
pub fn masked(config: &ClientConfig) -> ClientConfig {
    let mut shown = config.clone();
    if let Some(key) = &shown.llm.api_key {
        shown.llm.api_key = Some(mask_secret(key));
    }
    shown
}

/// Show at most the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    format!("{}****", secret.chars().take(4).collect::<String>())
}

fn chat_callbacks() -> AgentCallbacks {
    let printer = Arc::new(Mutex::new(StreamPrinter::default()));
    let on_text = printer.clone();
    let on_reply = printer.clone();
    let on_tool_call = printer.clone();
    let on_error = printer;

    AgentCallbacks {
        on_text: Some(Arc::new(move |delta: &str| {
            let mut printer = lock(&on_text);
            let first = !printer.started();
            if let Some(text) = printer.push(delta) {
                if first {
                    print!("{} ", "assistant>".green().bold());
                }
                print!("{}", text);
                let _ = io::stdout().flush();
            }
        })),
        on_reply: Some(Arc::new(move |reply: &str| match lock(&on_reply).finish(reply) {
            Some(text) => println!("{} {}", "assistant>".green().bold(), text),
            None => println!(),
        })),
        on_tool_call: Some(Arc::new(move |name: &str, arguments: &JsonObject| {
            lock(&on_tool_call).reset();
            let arguments = serde_json::Value::Object(arguments.clone());
            println!("{} {} {}", "◐ Running:".yellow(), name.bold(), arguments.to_string().dimmed());
        })),
        on_tool_result: Some(Arc::new(|_: &str, text: &str, is_error: bool| {
            if is_error {
                println!("{}", "✗ Failed:".red());
            } else {
                println!("{}", "✓ Result:".green());
            }
            for line in truncate(&pretty_json(text), MAX_RESULT_CHARS).lines() {
                println!("  {}", line);
            }
        })),
        on_error: Some(Arc::new(move |message: &str| {
            lock(&on_error).reset();
            eprintln!("\n{} {}", "Error:".red().bold(), message);
        })),
    }
}

fn lock(printer: &Mutex<StreamPrinter>) -> MutexGuard<'_, StreamPrinter> {
    printer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
