//! Plugin system for plughost
//!
//! This module provides the infrastructure for discovering, loading and
//! tracking plugins:
//!
//! - [`PluginManager`]: The registry of live plugins; runs the startup pass,
//!   loads and unloads by id and reconciles destruction notifications
//! - [`ModuleDiscovery`]: Enumerates installable modules ([`DirectoryDiscovery`]
//!   on disk, [`MemoryDiscovery`] in process)
//! - [`should_load`]: The enablement policy applied at startup
//! - [`check_version`]: The exact-match interface version gate
//! - [`ModuleLoader`]: Resolves a module to its version and factory
//!   ([`NativeModuleLoader`] via dynamic libraries, [`MemoryModuleLoader`] in process)
//! - [`PluginSettings`]: Persisted enablement overrides
//! - [`PluginHostError`]: Error types for plugin operations
//!
//! # Plugin Discovery
//!
//! Plugins are discovered from two directories:
//! 1. Project plugins: `$PLUGHOST_PROJECT_PLUGIN_DIR` (takes precedence)
//! 2. User plugins: `~/.config/plughost/plugins/`
//!
//! # Plugin Structure
//!
//! Each plugin directory should contain:
//! - `plugin.toml` - the module manifest (id, default enablement, library)
//! - `lib<id>.so` (or `.dylib`/`.dll`) - the plugin library, unless the
//!   manifest names another file
//!
//! # Example
//!
//! ```no_run
//! use plughost_core::plugins::{ManagerConfig, PluginManager};
//!
//! let mut manager = PluginManager::from_config(&ManagerConfig::default());
//!
//! manager.load_plugin("screencast");
//! manager.unload_plugin("colord");
//!
//! // From the host's main loop
//! manager.process_events();
//! ```

mod discovery;
mod error;
mod loader;
mod manager;
mod memory;
mod policy;
mod settings;
mod version;

pub use discovery::{DirectoryDiscovery, ModuleDiscovery, ModuleMetadata};
pub use error::PluginHostError;
pub use loader::{
    LoadedPlugin, ModuleLoader, NativeModuleLoader, PluginFactoryFn, ResolvedModule, load,
    validate_metadata,
};
pub use manager::{ManagerConfig, PROJECT_PLUGIN_DIR_ENV, PluginManager};
pub use memory::{MemoryDiscovery, MemoryModuleLoader};
pub use policy::{ConfigSource, config_key, should_load};
pub use settings::PluginSettings;
pub use version::check_version;
