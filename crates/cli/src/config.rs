//! Configuration management for the CLI

use std::path::{Path, PathBuf};

use analyzer_lib::AnalyzerConfig;
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Get the default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("apilog").join("config.toml"))
}

/// Load the analyzer configuration
///
/// An explicit path must exist; the default path is used only when present.
/// `APILOG_*` environment variables are layered on top either way.
pub fn load(override_path: Option<&Path>) -> Result<AnalyzerConfig> {
    let path = match override_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|path| path.exists()),
    };

    match &path {
        Some(path) => debug!(path = %path.display(), "Using config file"),
        None => debug!("No config file, using defaults and environment"),
    }

    AnalyzerConfig::load(path.as_deref()).context("Failed to load analyzer configuration")
}

/// Print the effective configuration as JSON
pub fn show(config: &AnalyzerConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}
