// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! LLM provider implementations.
//!
//! Every supported backend speaks the OpenAI chat-completions dialect, so a
//! single [`openai::OpenAIProvider`] covers them all; [`ProviderType`] only
//! picks defaults.
//!
//! ```rust,ignore
//! use mcpsh::providers::{create_provider, ProviderType};
//! use mcpsh::types::ProviderConfig;
//!
//! let config = ProviderConfig::new("your-api-key", "gpt-4o");
//! let provider = create_provider(ProviderType::OpenAI, config)?;
//! ```

pub mod openai;

pub use openai::OpenAIProvider;

use crate::config::LlmConfig;
use crate::error::ProviderError;
use crate::types::{BoxedProvider, ProviderConfig};

/// Supported provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// OpenAI GPT models
    OpenAI,
    /// Ollama local models via the `/v1` compatibility endpoint
    Ollama,
    /// DeepSeek hosted models
    DeepSeek,
    /// OpenRouter model gateway
    OpenRouter,
}

impl ProviderType {
    /// Get the default model for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Ollama => "llama3.2",
            Self::DeepSeek => "deepseek-chat",
            Self::OpenRouter => "openai/gpt-4o",
        }
    }

    /// Get the default base URL for this provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => openai::OPENAI_BASE_URL,
            Self::Ollama => openai::OLLAMA_BASE_URL,
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Check if this provider requires an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Conventional environment variable holding this provider's key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Ollama => None,
            Self::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
        }
    }
}

/// Error type for parsing a provider type from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProviderTypeError;

impl std::fmt::Display for ParseProviderTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid provider type (expected openai, ollama, deepseek or openrouter)")
    }
}

impl std::error::Error for ParseProviderTypeError {}

impl std::str::FromStr for ProviderType {
    type Err = ParseProviderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "deepseek" => Ok(Self::DeepSeek),
            "openrouter" => Ok(Self::OpenRouter),
            _ => Err(ParseProviderTypeError),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
            Self::DeepSeek => write!(f, "deepseek"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Create a provider instance from type and configuration.
///
/// Missing model and base URL fall back to the type's defaults.
///
/// # Errors
///
/// Returns [`ProviderError::NotConfigured`] when the type needs an API key and
/// none was given.
pub fn create_provider(
    provider_type: ProviderType,
    config: ProviderConfig,
) -> Result<BoxedProvider, ProviderError> {
    let api_key = config.api_key.clone().filter(|k| !k.is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(ProviderError::NotConfigured(format!(
            "API key required for {}",
            provider_type
        )));
    }

    let model = config
        .model
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| provider_type.default_model().to_string());

    let base_url = config
        .base_url
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| provider_type.default_base_url().to_string());

    Ok(Box::new(OpenAIProvider::new(api_key, model, base_url, config)))
}

/// Create a provider from the `llm` section of the client configuration.
///
/// An empty `api_key` falls back to the provider's conventional environment
/// variable (`OPENAI_API_KEY`, `DEEPSEEK_API_KEY`, `OPENROUTER_API_KEY`).
pub fn create_provider_from_config(llm: &LlmConfig) -> Result<BoxedProvider, ProviderError> {
    let provider_type: ProviderType = llm
        .provider
        .parse()
        .map_err(|e: ParseProviderTypeError| {
            ProviderError::NotConfigured(format!("'{}': {}", llm.provider, e))
        })?;

    let api_key = llm
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| {
            provider_type
                .api_key_env()
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.is_empty())
        });

    let config = ProviderConfig {
        api_key,
        base_url: llm.api_base.clone(),
        model: llm.model.clone(),
        temperature: llm.temperature,
        max_tokens: llm.max_tokens,
        timeout_ms: llm.timeout_ms,
    };

    create_provider(provider_type, config)
}
