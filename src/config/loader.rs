//! Configuration loading and discovery for `rsikit.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::RsikitConfig;
use crate::split::GroupingMode;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "rsikit.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse rsikit.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub license: Option<String>,
    pub copyright: Option<String>,
    pub mode: Option<GroupingMode>,
    pub assets: Option<PathBuf>,
}

/// Find rsikit.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for rsikit.toml
/// 2. Check XDG_CONFIG_HOME/rsikit/rsikit.toml (or ~/.config/rsikit/rsikit.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find rsikit.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("rsikit").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find rsikit.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an rsikit.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the defaults.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("tools/rsikit.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<RsikitConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("Loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(RsikitConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<RsikitConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: RsikitConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    // Relative asset directories are relative to the file
    if let (Some(assets), Some(root)) = (config.split.assets.as_mut(), project_root(path)) {
        *assets = resolve_path(root, assets);
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut RsikitConfig, overrides: &CliOverrides) {
    if let Some(ref license) = overrides.license {
        config.defaults.license = license.clone();
    }
    if let Some(ref copyright) = overrides.copyright {
        config.defaults.copyright = Some(copyright.clone());
    }
    if let Some(mode) = overrides.mode {
        config.split.mode = mode;
    }
    if let Some(ref assets) = overrides.assets {
        config.split.assets = Some(assets.clone());
    }
}

/// Directory holding the config file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
