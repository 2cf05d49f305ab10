// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module.
//!
//! Handles loading, merging, and persisting configuration from:
//! - Config file: `--config`, `$MCP_CLIENT_CONFIG`, `./config.yaml`,
//!   `./config/config.yaml`, or `<config_dir>/mcpsh/config.yaml`
//! - Environment: `MCP_CLIENT_LLM_*` and `MCP_CLIENT_CONSOLE_LOG_LEVEL`
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > environment > file > defaults).

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{
    discover_config_path, get_example_config, get_global_config_dir, get_global_config_path,
    load_config_file, save_config, CONFIG_ENV, CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};

pub use merger::{default_config, merge_config, CliOptions, EnvOverrides};

pub use types::{expand_home, ClientConfig, ConsoleConfig, LlmConfig, ServerTable, LOG_LEVELS};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::error::ConfigError;
use crate::mcp::{DescriptorStore, McpError, ServerDescriptor};

/// The on-disk config: where it lives and what the file says.
///
/// Holds the file's own values, not the merged view, so persisting a change
/// never writes environment or CLI overrides back to disk.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    exists: bool,
    config: Mutex<ClientConfig>,
}

impl ConfigFile {
    /// Wrap a config that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>, config: ClientConfig) -> Self {
        let path = path.into();
        let exists = path.is_file();
        Self {
            path,
            exists,
            config: Mutex::new(config),
        }
    }

    /// Discover and read the config file.
    ///
    /// With no file anywhere, defaults are used and later saves go to the
    /// global config path (or `./config.yaml` if there is no config dir).
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        match discover_config_path(explicit, cwd)? {
            Some(path) => {
                let config = load_config_file(&path)?;
                info!(path = %path.display(), servers = config.mcp_servers.len(), "Loaded config");
                Ok(Self::new(path, config))
            }
            None => {
                let path = get_global_config_path().unwrap_or_else(|| cwd.join(CONFIG_FILES[0]));
                info!(path = %path.display(), "No config file found, using defaults");
                Ok(Self::new(path, default_config()))
            }
        }
    }

    /// Re-read the file from disk.
    pub fn reload(&self) -> Result<ClientConfig, ConfigError> {
        let fresh = if self.path.is_file() {
            load_config_file(&self.path)?
        } else {
            default_config()
        };
        *self.lock() = fresh.clone();
        Ok(fresh)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed when loaded.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Copy of the file's values.
    pub fn snapshot(&self) -> ClientConfig {
        self.lock().clone()
    }

    /// Merged view with environment and CLI overrides applied.
    pub fn resolve(&self, env: &EnvOverrides, cli: &CliOptions) -> ClientConfig {
        merge_config(Some(self.snapshot()), env, cli)
    }

    /// Apply `change` and write the result to disk.
    ///
    /// The in-memory copy is left untouched if the write fails.
    pub fn update(&self, change: impl FnOnce(&mut ClientConfig)) -> Result<ClientConfig, ConfigError> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        change(&mut next);
        save_config(&self.path, &next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn lock(&self) -> MutexGuard<'_, ClientConfig> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DescriptorStore for ConfigFile {
    fn save_servers(&self, servers: &[ServerDescriptor]) -> Result<(), McpError> {
        self.update(|config| config.mcp_servers = ServerTable::from(servers.to_vec()))
            .map(|_| ())
            .map_err(McpError::from)
    }
}

/// Load the config file and merge overrides.
///
/// This is the main entry point for configuration loading.
pub fn load_config(
    explicit: Option<&Path>,
    cli: &CliOptions,
) -> Result<(ConfigFile, ClientConfig), ConfigError> {
    let cwd = std::env::current_dir()?;
    let file = ConfigFile::load(explicit, &cwd)?;
    let resolved = file.resolve(&EnvOverrides::from_env(), cli);
    resolved.validate()?;
    Ok((file, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            "llm:\n  provider: ollama\nmcp_servers:\n  b:\n    transport: stdio\n    command: b-server\n  a:\n    transport: sse\n    url: http://localhost:1/mcp\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        let file = ConfigFile::load(Some(&path), temp.path()).unwrap();
        assert!(file.exists());
        assert_eq!(file.path(), path);
        assert_eq!(file.snapshot().mcp_servers.names(), vec!["b", "a"]);
    }

    #[test]
    fn test_load_from_cwd() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path());

        let file = ConfigFile::load(None, temp.path()).unwrap();
        assert_eq!(file.snapshot().llm.provider, "ollama");
    }

    #[test]
    fn test_resolve_applies_overrides_without_touching_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());
        let file = ConfigFile::load(Some(&path), temp.path()).unwrap();

        let env = EnvOverrides {
            api_key: Some("sk-env".to_string()),
            ..Default::default()
        };
        let cli = CliOptions {
            provider: Some("openai".to_string()),
            ..Default::default()
        };
        let resolved = file.resolve(&env, &cli);
        assert_eq!(resolved.llm.provider, "openai");
        assert_eq!(resolved.llm.api_key.as_deref(), Some("sk-env"));

        let on_file = file.snapshot();
        assert_eq!(on_file.llm.provider, "ollama");
        assert!(on_file.llm.api_key.is_none());
    }

    #[test]
    fn test_store_persists_servers_in_order() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());
        let file = ConfigFile::load(Some(&path), temp.path()).unwrap();

        let servers = vec![
            ServerDescriptor::stream("a", "http://localhost:1/mcp"),
            ServerDescriptor::stdio("c", "c-server"),
        ];
        file.save_servers(&servers).unwrap();

        let reread = load_config_file(&path).unwrap();
        assert_eq!(reread.mcp_servers.names(), vec!["a", "c"]);
        assert_eq!(reread.llm.provider, "ollama");
    }

    #[test]
    fn test_update_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.yaml");
        let file = ConfigFile::new(&path, default_config());
        assert!(!file.exists());

        file.update(|config| config.llm.model = Some("gpt-4o-mini".to_string()))
            .unwrap();
        assert_eq!(
            load_config_file(&path).unwrap().llm.model.as_deref(),
            Some("gpt-4o-mini")
        );
    }

    #[test]
    fn test_failed_save_keeps_memory_copy() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be makes the write fail.
        let path = temp.path().join("config.yaml");
        std::fs::create_dir(&path).unwrap();
        let file = ConfigFile::new(&path, default_config());

        let result = file.save_servers(&[ServerDescriptor::stdio("x", "x")]);
        assert!(matches!(result, Err(McpError::Config(_))));
        assert!(file.snapshot().mcp_servers.is_empty());
    }

    #[test]
    fn test_reload_reads_disk() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());
        let file = ConfigFile::load(Some(&path), temp.path()).unwrap();

        std::fs::write(&path, "llm:\n  provider: deepseek\n").unwrap();
        let fresh = file.reload().unwrap();
        assert_eq!(fresh.llm.provider, "deepseek");
        assert!(file.snapshot().mcp_servers.is_empty());
    }
}
