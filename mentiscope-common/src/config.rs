//! Configuration loading and root folder resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment values arrive together through clap's `env`
//! support in the service crate; this module supplies the TOML and default tiers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the TOML config inside the root folder
pub const CONFIG_FILE_NAME: &str = "mentiscope.toml";

/// File name of the SQLite database inside the root folder
pub const DATABASE_FILE_NAME: &str = "mentiscope.db";

/// Contents of `mentiscope.toml`
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    /// Browser origin allowed by CORS
    pub frontend_url: Option<String>,
    pub llm: LlmSection,
    pub support: SupportSection,
    pub payments: PaymentsSection,
}

/// `[llm]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[support]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportSection {
    pub url: Option<String>,
    pub form_secret: Option<String>,
}

/// `[payments]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsSection {
    pub webhook_secret: Option<String>,
    pub checkout_base_url: Option<String>,
}

/// Resolve the root folder holding the database and config file
///
/// CLI/ENV value wins, then `root_folder` from the TOML file, then the OS default.
pub fn resolve_root_folder(cli_or_env: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_or_env {
        debug!("Root folder from command line / environment: {}", path.display());
        return path.to_path_buf();
    }

    if let Some(path) = &toml.root_folder {
        debug!("Root folder from TOML config: {}", path.display());
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/mentiscope (or /var/lib/mentiscope for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("mentiscope"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mentiscope"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/mentiscope
        dirs::data_dir()
            .map(|d| d.join("mentiscope"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/mentiscope"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\mentiscope
        dirs::data_local_dir()
            .map(|d| d.join("mentiscope"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mentiscope"))
    } else {
        PathBuf::from("./mentiscope_data")
    }
}

/// Default config file location: `~/.config/mentiscope/mentiscope.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mentiscope").join(CONFIG_FILE_NAME))
}

/// Load TOML config from `path`
///
/// A missing file yields the empty config; a malformed one is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Treat empty or whitespace-only strings as unset
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Pick the first configured value: CLI/ENV, then TOML
pub fn first_configured(cli_or_env: Option<String>, toml: Option<String>) -> Option<String> {
    non_blank(cli_or_env).or_else(|| non_blank(toml))
}
