//! XDG Base Directory paths for plughost.
//!
//! The host uses XDG paths on every platform so plugin directories and
//! settings files live in the same place regardless of OS.

use std::path::PathBuf;

/// Get the plughost config directory.
///
/// Returns `$XDG_CONFIG_HOME/plughost` if set, otherwise `~/.config/plughost`.
/// This is where the settings file and the user plugin directory live.
///
/// # Examples
///
/// ```
/// use plughost_paths::config_dir;
///
/// let config = config_dir();
/// let plugin_dir = config.join("plugins");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("plughost")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/plughost")
    } else {
        PathBuf::from(".config/plughost")
    }
}

/// Get the user plugin directory (`<config_dir>/plugins`).
pub fn plugin_dir() -> PathBuf {
    config_dir().join("plugins")
}

/// Get the settings file holding per-plugin enablement overrides.
pub fn settings_file() -> PathBuf {
    config_dir().join("plughost.toml")
}
