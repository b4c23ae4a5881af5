//! Module manifest shipped next to each plugin library

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// File name of the manifest inside a module directory
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Manifest describing an installable module
///
/// ```toml
/// id = "screencast"
/// name = "Screencast"
/// description = "Screen capture integration"
/// library = "libscreencast.so"
/// enabled_by_default = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Plugin identifier (registry key and settings key prefix)
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Module version (informational)
    #[serde(default = "default_version")]
    pub version: String,
    /// Library file, relative to the module directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Whether the module is loaded at startup without an explicit setting
    #[serde(default)]
    pub enabled_by_default: bool,
}

fn default_version() -> String {
    "0.0.1".to_string()
}

impl ModuleManifest {
    /// Parse a manifest from TOML
    pub fn parse(contents: &str) -> Result<Self, PluginError> {
        toml::from_str(contents).map_err(|e| PluginError::Manifest(e.to_string()))
    }

    /// Serialize the manifest to TOML
    pub fn to_toml(&self) -> Result<String, PluginError> {
        toml::to_string_pretty(self).map_err(|e| PluginError::Manifest(e.to_string()))
    }
}

impl Default for ModuleManifest {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            version: default_version(),
            library: None,
            enabled_by_default: false,
        }
    }
}
