//! PluginManager - the registry of live plugin instances

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use plughost_api::LifecycleEvent;

use super::discovery::{DirectoryDiscovery, ModuleDiscovery, ModuleMetadata};
use super::error::PluginHostError;
use super::loader::{self, LoadedPlugin, ModuleLoader, NativeModuleLoader};
use super::policy::{ConfigSource, should_load};
use super::settings::PluginSettings;

/// Configuration for PluginManager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// User plugin directory (~/.config/plughost/plugins)
    pub user_plugin_dir: PathBuf,
    /// Project-level plugin directory, searched first
    pub project_plugin_dir: Option<PathBuf>,
    /// Settings file with enablement overrides (~/.config/plughost/plughost.toml)
    pub settings_path: PathBuf,
}

/// Environment variable naming a project-level plugin directory
pub const PROJECT_PLUGIN_DIR_ENV: &str = "PLUGHOST_PROJECT_PLUGIN_DIR";

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            user_plugin_dir: plughost_paths::plugin_dir(),
            project_plugin_dir: std::env::var_os(PROJECT_PLUGIN_DIR_ENV).map(PathBuf::from),
            settings_path: plughost_paths::settings_file(),
        }
    }
}

impl ManagerConfig {
    /// Plugin directories in preference order (project first, then user)
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.project_plugin_dir
            .iter()
            .cloned()
            .chain(std::iter::once(self.user_plugin_dir.clone()))
            .collect()
    }
}

/// The plugin manager owns every loaded plugin, keyed by plugin id.
///
/// One manager per process; the host's composition root creates it once and
/// drops it at shutdown. Everything runs on the caller's thread: no method
/// blocks beyond a directory scan or a library load, and none yields while
/// the registry is being changed.
///
/// Every instance is wired at insertion to report its destruction. Removal
/// on that report is remove-if-present, so an instance destroyed by
/// [`unload_plugin`](Self::unload_plugin) is never removed twice.
pub struct PluginManager {
    /// Loaded plugins by id
    plugins: HashMap<String, LoadedPlugin>,
    discovery: Box<dyn ModuleDiscovery>,
    loader: Box<dyn ModuleLoader>,
    events_tx: UnboundedSender<LifecycleEvent>,
    events_rx: UnboundedReceiver<LifecycleEvent>,
    /// Serial handed to the next load
    next_serial: u64,
}

impl PluginManager {
    /// Create the manager over the configured plugin directories and load
    /// every enabled plugin.
    ///
    /// An unreadable settings file is reported and treated as empty; startup
    /// always completes.
    pub fn from_config(config: &ManagerConfig) -> Self {
        let settings = PluginSettings::load(&config.settings_path).unwrap_or_else(|e| {
            tracing::warn!(
                path = %config.settings_path.display(),
                error = %e,
                "Ignoring plugin settings"
            );
            PluginSettings::default()
        });

        Self::new(
            Box::new(DirectoryDiscovery::new(config.search_dirs())),
            Box::new(NativeModuleLoader),
            &settings,
        )
    }

    /// Create a manager and run the startup pass: enumerate every module,
    /// apply the enablement policy and load the selected ones.
    pub fn new(
        discovery: Box<dyn ModuleDiscovery>,
        loader: Box<dyn ModuleLoader>,
        config: &dyn ConfigSource,
    ) -> Self {
        let mut manager = Self::empty(discovery, loader);
        manager.load_enabled(config);
        manager
    }

    /// Create a manager without loading anything
    pub fn empty(discovery: Box<dyn ModuleDiscovery>, loader: Box<dyn ModuleLoader>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            plugins: HashMap::new(),
            discovery,
            loader,
            events_tx,
            events_rx,
            next_serial: 1,
        }
    }

    /// Startup pass; per-module failures are logged and skipped
    fn load_enabled(&mut self, config: &dyn ConfigSource) {
        for metadata in self.discovery.enumerate_all() {
            if !should_load(&metadata, config) {
                tracing::debug!(plugin = %metadata.id, "Plugin disabled, skipping");
                continue;
            }
            self.load_plugin_metadata(&metadata);
        }

        tracing::info!(count = self.plugins.len(), "Plugin startup complete");
    }

    /// Ids of the currently registered plugins, sorted
    pub fn loaded_plugins(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids of every installable module, loaded or not, sorted
    ///
    /// Records discovery marked invalid are left out.
    pub fn available_plugins(&self) -> Vec<String> {
        self.discovery
            .enumerate_all()
            .into_iter()
            .filter(|m| m.valid)
            .map(|m| m.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check if a plugin is registered
    pub fn is_loaded(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Get the number of loaded plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Load a plugin by id.
    ///
    /// Candidates claiming `id` are tried in discovery preference order and
    /// the first one that loads is registered. The enablement policy is not
    /// consulted. Returns `false`, leaving the registry untouched, when the
    /// id is already loaded or no candidate loads.
    pub fn load_plugin(&mut self, id: &str) -> bool {
        if self.plugins.contains_key(id) {
            tracing::debug!(plugin = %id, "Plugin is already loaded");
            return false;
        }

        let candidates = self.discovery.enumerate_by_id(id);
        if candidates.is_empty() {
            tracing::warn!(plugin = %id, "No plugin module with this id");
            return false;
        }

        candidates.iter().any(|metadata| self.load_plugin_metadata(metadata))
    }

    /// Load a plugin from metadata directly, bypassing discovery.
    ///
    /// An already registered id is skipped silently (`false`, debug log).
    pub fn load_plugin_metadata(&mut self, metadata: &ModuleMetadata) -> bool {
        match self.try_load(metadata) {
            Ok(()) => true,
            Err(e @ PluginHostError::DuplicateIdentifier { .. }) => {
                tracing::debug!(plugin = %metadata.id, error = %e, "Skipping plugin");
                false
            }
            Err(e) => {
                tracing::warn!(
                    plugin = %metadata.id,
                    path = %metadata.file.display(),
                    error = %e,
                    "Failed to load plugin"
                );
                false
            }
        }
    }

    fn try_load(&mut self, metadata: &ModuleMetadata) -> Result<(), PluginHostError> {
        loader::validate_metadata(metadata)?;

        if self.plugins.contains_key(&metadata.id) {
            return Err(PluginHostError::DuplicateIdentifier {
                id: metadata.id.clone(),
            });
        }

        let serial = self.next_serial;
        self.next_serial += 1;

        let plugin = loader::load(
            metadata,
            self.loader.as_ref(),
            serial,
            self.events_tx.clone(),
        )?;

        tracing::info!(
            plugin = %metadata.id,
            version = %metadata.version,
            path = %metadata.file.display(),
            "Plugin loaded"
        );
        self.plugins.insert(metadata.id.clone(), plugin);
        Ok(())
    }

    /// Unload and destroy a plugin.
    ///
    /// An id that is not registered is reported and otherwise ignored.
    /// Queued notifications are handled afterwards, as by
    /// [`process_events`](Self::process_events).
    pub fn unload_plugin(&mut self, id: &str) {
        match self.plugins.remove(id) {
            Some(plugin) => {
                drop(plugin);
                tracing::info!(plugin = %id, "Plugin unloaded");
                self.process_events();
            }
            None => {
                let err = PluginHostError::NotRegistered { id: id.to_string() };
                tracing::warn!(error = %err, "Cannot unload plugin");
            }
        }
    }

    /// Unload every plugin, in id order
    pub fn unload_all(&mut self) {
        for id in self.loaded_plugins() {
            self.unload_plugin(&id);
        }
    }

    /// Handle queued lifecycle notifications.
    ///
    /// The host calls this from its main loop; [`unload_plugin`](Self::unload_plugin)
    /// also drains the queue, so notifications from explicit unloads never
    /// pile up. Destroy requests from plugins
    /// tear the requesting instance down; destruction reports remove the
    /// entry if it is still present. Notifications about an earlier load of
    /// an id never touch a later one. Returns how many plugins were torn down.
    pub fn process_events(&mut self) -> usize {
        let mut destroyed = 0;

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LifecycleEvent::DestroyRequested { id, serial } => {
                    if self.take_if_current(&id, serial).is_some() {
                        tracing::info!(plugin = %id, "Plugin destroyed itself");
                        destroyed += 1;
                    } else {
                        tracing::debug!(plugin = %id, serial, "Stale destroy request ignored");
                    }
                }
                LifecycleEvent::Destroyed { id, serial } => {
                    if self.take_if_current(&id, serial).is_some() {
                        tracing::warn!(plugin = %id, "Destroyed plugin was still registered");
                    } else {
                        tracing::trace!(plugin = %id, serial, "Plugin already removed");
                    }
                }
            }
        }

        destroyed
    }

    /// Remove and drop the entry for `id` if it belongs to load `serial`
    fn take_if_current(&mut self, id: &str, serial: u64) -> Option<()> {
        if self.plugins.get(id)?.serial() != serial {
            return None;
        }
        drop(self.plugins.remove(id)?);
        Some(())
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.unload_all();
    }
}
