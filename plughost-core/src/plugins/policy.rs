//! Enablement policy - decides which discovered modules load at startup

use std::collections::HashMap;

use super::discovery::ModuleMetadata;

/// Suffix appended to a plugin id to form its settings key
const ENABLED_SUFFIX: &str = "Enabled";

/// Read-only boolean lookup into the host configuration
pub trait ConfigSource {
    /// Value of `key`, or `None` if the key is absent
    fn read_bool(&self, key: &str) -> Option<bool>;
}

impl ConfigSource for HashMap<String, bool> {
    fn read_bool(&self, key: &str) -> Option<bool> {
        self.get(key).copied()
    }
}

/// Settings key for a plugin id, e.g. `screencastEnabled`
pub fn config_key(id: &str) -> String {
    format!("{id}{ENABLED_SUFFIX}")
}

/// Whether a discovered module should be loaded at startup.
///
/// An explicit setting wins, including an explicit `false` for a module that
/// is enabled by default. Without one the module's own default applies.
pub fn should_load(metadata: &ModuleMetadata, config: &dyn ConfigSource) -> bool {
    match config.read_bool(&config_key(&metadata.id)) {
        Some(enabled) => enabled,
        None => metadata.enabled_by_default,
    }
}
