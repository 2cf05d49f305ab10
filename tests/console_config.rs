// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Console commands that change the configuration file.

use tempfile::TempDir;

use mcpsh::config::{get_example_config, CliOptions, ConfigFile, EnvOverrides};
use mcpsh::console::{apply_llm_update, parse_command, render_config, Command};
use mcpsh::mcp::Transport;
use mcpsh::ProviderType;

fn llm_update(line: &str) -> mcpsh::console::LlmUpdate {
    match parse_command(line).unwrap() {
        Some(Command::ConfigLlm(update)) => update,
        other => panic!("expected config llm, got {:?}", other),
    }
}

#[test]
fn test_config_llm_switch_is_written_and_reloaded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yaml");

    let mut example = get_example_config();
    example.llm.api_key = Some("sk-openai-secret".to_string());
    let file = ConfigFile::new(&path, example);

    let update = llm_update("config llm ollama model=llama3.2");
    let provider: ProviderType = update.provider.parse().unwrap();
    file.update(|config| apply_llm_update(&mut config.llm, provider, update))
        .unwrap();

    let reloaded = ConfigFile::load(Some(path.as_path()), temp.path()).unwrap().snapshot();
    assert_eq!(reloaded.llm.provider, "ollama");
    assert_eq!(reloaded.llm.model.as_deref(), Some("llama3.2"));
    assert_eq!(reloaded.llm.api_key, None);
    assert_eq!(reloaded.mcp_servers.names(), vec!["weather", "files"]);
}

#[test]
fn test_environment_still_overrides_the_file_view() {
    let temp = TempDir::new().unwrap();
    let file = ConfigFile::new(temp.path().join("config.yaml"), get_example_config());

    let env = EnvOverrides::from_lookup(|key| match key {
        "MCP_CLIENT_LLM_MODEL" => Some("gpt-4o-mini".to_string()),
        _ => None,
    });
    let cli = CliOptions {
        provider: Some("deepseek".to_string()),
        ..Default::default()
    };

    let resolved = file.resolve(&env, &cli);
    assert_eq!(resolved.llm.provider, "deepseek");
    assert_eq!(resolved.llm.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(file.snapshot().llm.provider, "openai");
}

#[test]
fn test_add_server_command_builds_valid_descriptor() {
    let Some(Command::ConfigAddServer(descriptor)) =
        parse_command(r#"config add-server notes stdio notes-mcp --root "/home/me/My Notes""#).unwrap()
    else {
        panic!("expected add-server");
    };
    assert!(descriptor.transport.validate(&descriptor.name).is_ok());
    match &descriptor.transport {
        Transport::Process { command, args, .. } => {
            assert_eq!(command, "notes-mcp");
            assert_eq!(args, &["--root", "/home/me/My Notes"]);
        }
        other => panic!("expected process transport, got {:?}", other),
    }
}

#[test]
fn test_rendered_config_masks_key() {
    let mut config = get_example_config();
    config.llm.api_key = Some("sk-live-0123456789".to_string());

    let text = render_config(std::path::Path::new("config.yaml"), &config).unwrap();
    assert!(text.starts_with("# config.yaml\n"));
    assert!(text.contains("sk-l****"));
    assert!(!text.contains("0123456789"));
    assert!(text.contains("weather"));
}
