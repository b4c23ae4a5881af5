//! plughost-core: Core library for the plughost plugin manager
//!
//! This crate provides the plugin registry and everything it sequences:
//!
//! - **Discovery** - [`ModuleDiscovery`] enumerates installable modules
//! - **Enablement policy** - [`should_load`] decides what loads at startup
//! - **Version gate** - [`check_version`] rejects mismatched modules
//! - **Loader** - [`ModuleLoader`] resolves modules, [`plugins::load`] instantiates them
//! - **Registry** - [`PluginManager`] owns live instances until they are destroyed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    PluginManager                     │
//! │                                                      │
//! │  Discovery ─► Policy ─► Version gate ─► Loader ─┐    │
//! │                                                 ▼    │
//! │             HashMap<id, LoadedPlugin> ◄─ insert      │
//! │                     ▲                                │
//! │                     └─ LifecycleEvent (destroyed,    │
//! │                        destroy requested)            │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod plugins;

pub use plugins::{
    ConfigSource, DirectoryDiscovery, ManagerConfig, MemoryDiscovery, MemoryModuleLoader,
    ModuleDiscovery, ModuleLoader, ModuleMetadata, NativeModuleLoader, PluginHostError,
    PluginManager, PluginSettings, check_version, should_load,
};
