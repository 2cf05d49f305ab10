// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles layering environment variables and CLI flags over the file config.

use super::types::ClientConfig;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
}

/// Overrides read from `MCP_CLIENT_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub log_level: Option<String>,
}

impl EnvOverrides {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            provider: get("MCP_CLIENT_LLM_PROVIDER"),
            model: get("MCP_CLIENT_LLM_MODEL"),
            api_key: get("MCP_CLIENT_LLM_API_KEY"),
            api_base: get("MCP_CLIENT_LLM_API_BASE"),
            log_level: get("MCP_CLIENT_CONSOLE_LOG_LEVEL"),
        }
    }
}

/// Default configuration values.
pub fn default_config() -> ClientConfig {
    ClientConfig::default()
}

/// Merge configuration sources with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn merge_config(file: Option<ClientConfig>, env: &EnvOverrides, cli: &CliOptions) -> ClientConfig {
    let mut result = file.unwrap_or_else(default_config);
    apply_env_overrides(&mut result, env);
    apply_cli_options(&mut result, cli);
    result
}

fn apply_env_overrides(result: &mut ClientConfig, env: &EnvOverrides) {
    if let Some(ref provider) = env.provider {
        result.llm.provider = provider.clone();
    }

    if env.model.is_some() {
        result.llm.model = env.model.clone();
    }

    if env.api_key.is_some() {
        result.llm.api_key = env.api_key.clone();
    }

    if env.api_base.is_some() {
        result.llm.api_base = env.api_base.clone();
    }

    if let Some(ref level) = env.log_level {
        result.console.log_level = level.clone();
    }
}

fn apply_cli_options(result: &mut ClientConfig, cli: &CliOptions) {
    if let Some(ref provider) = cli.provider {
        result.llm.provider = provider.clone();
    }

    if cli.model.is_some() {
        result.llm.model = cli.model.clone();
    }

    if cli.api_base.is_some() {
        result.llm.api_base = cli.api_base.clone();
    }

    if cli.api_key.is_some() {
        result.llm.api_key = cli.api_key.clone();
    }

    if let Some(ref level) = cli.log_level {
        result.console.log_level = level.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.console.log_level, "info");
    }

    #[test]
    fn test_merge_config_precedence() {
        let mut file = ClientConfig::default();
        file.llm.provider = "ollama".to_string();
        file.llm.model = Some("file-model".to_string());
        file.llm.api_base = Some("http://file".to_string());

        let env = EnvOverrides {
            model: Some("env-model".to_string()),
            api_base: Some("http://env".to_string()),
            ..Default::default()
        };

        let cli = CliOptions {
            api_base: Some("http://cli".to_string()),
            ..Default::default()
        };

        let result = merge_config(Some(file), &env, &cli);

        // File provider survives
        assert_eq!(result.llm.provider, "ollama");
        // Environment beats the file
        assert_eq!(result.llm.model, Some("env-model".to_string()));
        // CLI beats the environment
        assert_eq!(result.llm.api_base, Some("http://cli".to_string()));
    }

    #[test]
    fn test_merge_without_file_uses_defaults() {
        let cli = CliOptions {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let result = merge_config(None, &EnvOverrides::default(), &cli);
        assert_eq!(result.llm.provider, "openai");
        assert_eq!(result.console.log_level, "debug");
    }

    #[test]
    fn test_env_from_lookup() {
        let vars = HashMap::from([
            ("MCP_CLIENT_LLM_PROVIDER", "deepseek"),
            ("MCP_CLIENT_LLM_API_KEY", "sk-env"),
            ("MCP_CLIENT_LLM_MODEL", "  "),
            ("MCP_CLIENT_CONSOLE_LOG_LEVEL", "warn"),
        ]);
        let env = EnvOverrides::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env.provider.as_deref(), Some("deepseek"));
        assert_eq!(env.api_key.as_deref(), Some("sk-env"));
        assert_eq!(env.model, None);
        assert_eq!(env.api_base, None);
        assert_eq!(env.log_level.as_deref(), Some("warn"));
    }
}
