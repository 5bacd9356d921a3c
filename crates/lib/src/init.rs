//! Initialize the configuration directory: create ~/.bizlocate, a default config and an empty
//! context snapshot for the analysis tool to overwrite.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{AnalysisConfig, Config};
use crate::context::ContextSnapshot;

const DEFAULT_CONTEXT_FILE: &str = "context.json";

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with default assistant settings and `analysis.contextPath` if missing.
/// - Writes an empty `context.json` next to it if missing.
///
/// Existing files are left untouched. Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let config = Config {
            analysis: AnalysisConfig {
                context_path: Some(PathBuf::from(DEFAULT_CONTEXT_FILE)),
            },
            ..Config::default()
        };
        let s = serde_json::to_string_pretty(&config).context("serializing default config")?;
        std::fs::write(config_path, s)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let context_path = config_dir.join(DEFAULT_CONTEXT_FILE);
    if !context_path.exists() {
        let s = serde_json::to_string_pretty(&ContextSnapshot::default())
            .context("serializing empty context")?;
        std::fs::write(&context_path, s)
            .with_context(|| format!("writing empty context to {}", context_path.display()))?;
        log::info!("created empty context at {}", context_path.display());
    } else {
        log::debug!("context file already exists at {}, skipping", context_path.display());
    }

    Ok(config_dir.to_path_buf())
}
