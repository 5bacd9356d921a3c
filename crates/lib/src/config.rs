//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.bizlocate/config.json`) and environment.
//! The only secret is the OpenAI API key, which is normally supplied through `OPENAI_API_KEY`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Environment variable holding the API key. Overrides `assistant.apiKey`.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote model settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Where the analysis context comes from.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Chat-completion endpoint, model and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// OpenAI-compatible base URL (default "https://api.openai.com/v1"). `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model id sent with every request (default "gpt-3.5-turbo").
    #[serde(default = "default_model")]
    pub model: String,

    /// Response length cap (default 800).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (default 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// API key. Overridden by OPENAI_API_KEY env. Prefer the env var; this field is for local setups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

/// Analysis context source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Context snapshot JSON written by the analysis tool. Relative paths are resolved against the config file's parent. Overridden by BIZLOCATE_CONTEXT_PATH env.
    #[serde(default)]
    pub context_path: Option<PathBuf>,
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the API key: env OPENAI_API_KEY overrides config. Blank values count as absent.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    non_empty_env(API_KEY_ENV).or_else(|| {
        config
            .assistant
            .api_key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("BIZLOCATE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".bizlocate").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or BIZLOCATE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving relative paths).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Resolve the context snapshot path: env BIZLOCATE_CONTEXT_PATH, then `analysis.contextPath`
/// (relative paths resolved against the config file's parent). None when neither is set.
pub fn resolve_context_path(config: &Config, config_path: &Path) -> Option<PathBuf> {
    if let Some(p) = non_empty_env("BIZLOCATE_CONTEXT_PATH") {
        return Some(PathBuf::from(p));
    }
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match &config.analysis.context_path {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                Some(p.clone())
            } else {
                Some(config_parent.join(p))
            }
        }
        _ => None,
    }
}
