//! Plugin settings - persisted enablement overrides

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use toml::Value;

use super::error::PluginHostError;
use super::policy::{ConfigSource, config_key};

/// Per-plugin enablement overrides
///
/// Stored as TOML in `~/.config/plughost/plughost.toml`:
///
/// ```toml
/// [plugins]
/// screencastEnabled = false
/// colordEnabled = true
/// ```
///
/// Entries are kept as raw TOML values so that one malformed entry only
/// affects its own plugin; non-boolean values read as absent.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Override entries keyed by `<id>Enabled`
    #[serde(default)]
    pub plugins: BTreeMap<String, Value>,
}

impl PluginSettings {
    /// Load settings from a TOML file
    ///
    /// Returns empty settings if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PluginHostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self =
            toml::from_str(&content).map_err(|e| PluginHostError::Settings(e.to_string()))?;

        for (key, value) in settings.plugins.iter().filter(|(_, v)| !v.is_bool()) {
            tracing::warn!(
                path = %path.display(),
                key = %key,
                found = %value.type_str(),
                "Ignoring non-boolean plugin setting"
            );
        }
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), PluginHostError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PluginHostError::Settings(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set an explicit override for a plugin
    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        self.plugins.insert(config_key(id), Value::Boolean(enabled));
    }

    /// Remove the override so the module default applies again
    pub fn clear(&mut self, id: &str) -> bool {
        self.plugins.remove(&config_key(id)).is_some()
    }

    /// Iterate over the usable `(key, value)` override entries
    pub fn overrides(&self) -> impl Iterator<Item = (&str, bool)> {
        self.plugins
            .iter()
            .filter_map(|(k, v)| v.as_bool().map(|b| (k.as_str(), b)))
    }
}

impl ConfigSource for PluginSettings {
    fn read_bool(&self, key: &str) -> Option<bool> {
        self.plugins.get(key).and_then(Value::as_bool)
    }
}
