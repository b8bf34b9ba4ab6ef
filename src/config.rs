//! Configuration resolution
//!
//! Provides multi-tier configuration resolution with CLI → ENV → TOML
//! priority for the Last.fm API key.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};

const API_KEY_ENV: &str = "TAGFORGE_LASTFM_API_KEY";

/// TOML configuration file contents.
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub lastfm_api_key: Option<String>,
}

/// Default config location: `~/.config/tagforge/tagforge.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagforge").join("tagforge.toml"))
}

/// Load the TOML config at `path`; a missing file is an empty config.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Resolve the Last.fm API key from 3-tier configuration
///
/// **Priority:** CLI → ENV → TOML
pub fn resolve_lastfm_api_key(
    cli_key: Option<&str>,
    toml_config: &TomlConfig,
) -> Result<String> {
    let mut sources = Vec::new();

    let cli_key = cli_key.filter(|key| is_valid_key(key));
    if cli_key.is_some() {
        sources.push("command line");
    }

    let env_key = std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| is_valid_key(key));
    if env_key.is_some() {
        sources.push("environment");
    }

    let toml_key = toml_config
        .lastfm_api_key
        .as_deref()
        .filter(|key| is_valid_key(key));
    if toml_key.is_some() {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Last.fm API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = cli_key {
        info!("Last.fm API key taken from command line");
        return Ok(key.to_string());
    }

    if let Some(key) = env_key {
        info!("Last.fm API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Last.fm API key loaded from TOML config");
        return Ok(key.to_string());
    }

    Err(Error::Config(format!(
        "Last.fm API key not configured. Please configure using one of:\n\
         1. Command line: --lastfm-api-key your-key-here\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: ~/.config/tagforge/tagforge.toml (lastfm_api_key = \"your-key\")\n\
         \n\
         Obtain API key at: https://www.last.fm/api/account/create",
        API_KEY_ENV
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
