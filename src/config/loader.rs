// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles finding the config file and reading or writing it as YAML or JSON.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::types::ClientConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MCP_CLIENT_CONFIG";

/// Config file names searched relative to the working directory (in order).
pub const CONFIG_FILES: &[&str] = &["config.yaml", "config/config.yaml"];

/// Directory under the platform config dir.
pub const GLOBAL_CONFIG_DIR: &str = "mcpsh";

/// Config file name inside [`GLOBAL_CONFIG_DIR`].
pub const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Find the config file to use.
///
/// Searches in this order:
/// 1. `explicit` (from `--config`)
/// 2. `$MCP_CLIENT_CONFIG`
/// 3. `./config.yaml`
/// 4. `./config/config.yaml`
/// 5. `<config_dir>/mcpsh/config.yaml`
///
/// An explicit path or environment path that does not exist is an error;
/// the rest are skipped when missing. `Ok(None)` means use defaults.
pub fn discover_config_path(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let env_path = std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    find_config_path(explicit, env_path, cwd, get_global_config_path())
}

fn find_config_path(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    cwd: &Path,
    global: Option<PathBuf>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        return Ok(Some(path));
    }

    let found = CONFIG_FILES
        .iter()
        .map(|name| cwd.join(name))
        .chain(global)
        .find(|path| path.is_file());
    Ok(found)
}

/// Load a configuration file (YAML, or JSON by extension).
pub fn load_config_file(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "Loading config file");

    if content.trim().is_empty() {
        return Ok(ClientConfig::default());
    }

    if is_json(path) {
        serde_json::from_str(&content).map_err(ConfigError::from)
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::from)
    }
}

/// Save configuration, creating parent directories as needed.
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_json(path) {
        serde_json::to_string_pretty(config)?
    } else {
        serde_yaml::to_string(config)?
    };
    std::fs::write(path, content)?;
    debug!(path = %path.display(), "Saved config file");
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Get an example configuration.
pub fn get_example_config() -> ClientConfig {
    use crate::mcp::ServerDescriptor;

    let mut config = ClientConfig::default();
    config.llm.model = Some("gpt-4o".to_string());
    config.mcp_servers.insert(
        ServerDescriptor::stream("weather", "http://localhost:8000/mcp").as_default(),
    );
    config.mcp_servers.insert(
        ServerDescriptor::stdio("files", "npx")
            .with_args(["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]),
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_files_order() {
        assert_eq!(CONFIG_FILES.len(), 2);
        assert_eq!(CONFIG_FILES[0], "config.yaml");
    }

    #[test]
    fn test_global_config_path() {
        if let Some(path) = get_global_config_path() {
            assert!(path.ends_with("mcpsh/config.yaml"));
        }
    }

    #[test]
    fn test_find_explicit_wins() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("mine.yaml");
        std::fs::write(&explicit, "{}").unwrap();
        std::fs::write(temp.path().join("config.yaml"), "{}").unwrap();

        let found = find_config_path(Some(&explicit), None, temp.path(), None).unwrap();
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_find_missing_explicit_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml");
        let result = find_config_path(Some(&missing), None, temp.path(), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));

        let result = find_config_path(None, Some(missing), temp.path(), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_find_env_before_cwd() {
        let temp = TempDir::new().unwrap();
        let env_file = temp.path().join("env.yaml");
        std::fs::write(&env_file, "{}").unwrap();
        std::fs::write(temp.path().join("config.yaml"), "{}").unwrap();

        let found = find_config_path(None, Some(env_file.clone()), temp.path(), None).unwrap();
        assert_eq!(found, Some(env_file));
    }

    #[test]
    fn test_find_cwd_then_nested_then_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.yaml");
        std::fs::write(&global, "{}").unwrap();

        let found = find_config_path(None, None, temp.path(), Some(global.clone())).unwrap();
        assert_eq!(found, Some(global.clone()));

        std::fs::create_dir(temp.path().join("config")).unwrap();
        let nested = temp.path().join("config/config.yaml");
        std::fs::write(&nested, "{}").unwrap();
        let found = find_config_path(None, None, temp.path(), Some(global.clone())).unwrap();
        assert_eq!(found, Some(nested));

        let top = temp.path().join("config.yaml");
        std::fs::write(&top, "{}").unwrap();
        let found = find_config_path(None, None, temp.path(), Some(global)).unwrap();
        assert_eq!(found, Some(top));
    }

    #[test]
    fn test_find_nothing() {
        let temp = TempDir::new().unwrap();
        let found = find_config_path(None, None, temp.path(), None).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_load_yaml_and_json() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("c.yaml");
        std::fs::write(&yaml, "llm:\n  provider: ollama\n").unwrap();
        assert_eq!(load_config_file(&yaml).unwrap().llm.provider, "ollama");

        let json = temp.path().join("c.json");
        std::fs::write(&json, r#"{"llm": {"provider": "deepseek"}}"#).unwrap();
        assert_eq!(load_config_file(&json).unwrap().llm.provider, "deepseek");
    }

    #[test]
    fn test_load_empty_and_invalid() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty.yaml");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(load_config_file(&empty).unwrap(), ClientConfig::default());

        let bad = temp.path().join("bad.yaml");
        std::fs::write(&bad, "llm: [unclosed").unwrap();
        assert!(matches!(load_config_file(&bad), Err(ConfigError::YamlError(_))));

        let missing = temp.path().join("missing.yaml");
        assert!(matches!(load_config_file(&missing), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_save_creates_parents_and_round_trips() {
        let temp = TempDir::new().unwrap();
        let config = get_example_config();

        let yaml = temp.path().join("a/b/config.yaml");
        save_config(&yaml, &config).unwrap();
        assert_eq!(load_config_file(&yaml).unwrap(), config);

        let json = temp.path().join("config.json");
        save_config(&json, &config).unwrap();
        let content = std::fs::read_to_string(&json).unwrap();
        assert!(content.trim_start().starts_with('{'));
        assert_eq!(load_config_file(&json).unwrap(), config);
    }

    #[test]
    fn test_example_config() {
        let config = get_example_config();
        assert_eq!(config.mcp_servers.names(), vec!["weather", "files"]);
        assert!(config.mcp_servers.get("weather").unwrap().default);
        assert!(config.validate().is_ok());
    }
}
