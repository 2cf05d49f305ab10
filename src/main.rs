// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! mcpsh main entry point - CLI and console startup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use mcpsh::config::{self, CliOptions, ConfigFile, EnvOverrides};
use mcpsh::console::{render_config, ConnectMode, Console};
use mcpsh::mcp::RmcpConnector;
use mcpsh::telemetry::{init_telemetry, TelemetryConfig};

/// mcpsh version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// mcpsh - interactive console for MCP servers.
#[derive(Parser)]
#[command(name = "mcpsh")]
#[command(author, version, about = "Interactive console for MCP tool servers", long_about = None)]
struct Cli {
    /// Config file (YAML, or JSON by extension)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// LLM provider (openai, ollama, deepseek, openrouter)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long)]
    api_base: Option<String>,

    /// Connect only this server on start (repeatable)
    #[arg(short, long = "server", value_name = "NAME")]
    servers: Vec<String>,

    /// Start without connecting any server
    #[arg(long, conflicts_with = "servers")]
    no_connect: bool,

    /// Show debug logs
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Show trace logs, protocol traffic included
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Subcommands for mcpsh.
#[derive(Subcommand)]
enum Commands {
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Where to write it (defaults to the discovered config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_options = CliOptions {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        api_base: cli.api_base.clone(),
        api_key: None,
        log_level: None,
    };

    if let Some(command) = cli.command {
        return handle_command(command, cli.config, &cli_options);
    }

    let (file, resolved) = config::load_config(cli.config.as_deref(), &cli_options)?;

    let telemetry = if cli.debug {
        TelemetryConfig::development()
    } else if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::from_log_level(&resolved.console.log_level)
    };
    let _guard = init_telemetry(&telemetry)?;

    let mode = if cli.no_connect {
        ConnectMode::Skip
    } else if !cli.servers.is_empty() {
        ConnectMode::Only(cli.servers)
    } else {
        ConnectMode::Enabled
    };

    let console = Console::new(
        Arc::new(file),
        EnvOverrides::from_env(),
        cli_options,
        Arc::new(RmcpConnector),
    )?;
    console.connect_on_start(&mode).await;
    console.run().await
}

fn handle_command(command: Commands, explicit: Option<PathBuf>, cli: &CliOptions) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let (file, resolved) = config::load_config(explicit.as_deref(), cli)?;
                print!("{}", render_config(file.path(), &resolved)?);
            }
            Some(ConfigAction::Init { path, force }) => {
                let path = match path.or(explicit) {
                    Some(path) => path,
                    None => ConfigFile::load(None, &std::env::current_dir()?)?.path().to_path_buf(),
                };
                if path.exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                }
                config::save_config(&path, &config::get_example_config())?;
                println!("Created config file: {}", path.display());
            }
        },
        Commands::Version => {
            println!("mcpsh {}", VERSION);
        }
    }
    Ok(())
}
