//! Configuration schema types for `rsikit.toml`
//!
//! Defines the structure and validation rules for converter defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rsi::{DEFAULT_LICENSE, RSI_VERSION};
use crate::split::GroupingMode;

/// Metadata written into every bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// License identifier
    #[serde(default = "default_license")]
    pub license: String,
    /// Copyright notice; remote sources fall back to their URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// RSI format version
    #[serde(default = "default_version")]
    pub version: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { license: default_license(), copyright: None, version: default_version() }
    }
}

fn default_license() -> String {
    DEFAULT_LICENSE.to_string()
}

fn default_version() -> u32 {
    RSI_VERSION
}

/// Settings for `rsikit split`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Grouping mode used when `--mode` is not given
    #[serde(default)]
    pub mode: GroupingMode,
    /// Directory of reference images (`inhand-left.png`, `inhand-right.png`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<PathBuf>,
}

/// Root of `rsikit.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsikitConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub split: SplitConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "defaults.license")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rsikit.toml: '{}' {}", self.field, self.message)
    }
}

impl RsikitConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.defaults.license.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "defaults.license".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.defaults.version == 0 {
            errors.push(ConfigValidationError {
                field: "defaults.version".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
