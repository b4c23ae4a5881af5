//! In-process discovery and loading, for built-in plugins and tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use plughost_api::{PLUGIN_API_VERSION, Plugin, PluginOwner};

use super::discovery::{ModuleDiscovery, ModuleMetadata};
use super::error::PluginHostError;
use super::loader::{ModuleLoader, PluginFactoryFn, ResolvedModule};

/// Discovery over a list of metadata records held in memory
///
/// Clones share the same list, so records can be added after the discovery
/// was handed to a manager.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiscovery {
    modules: Arc<Mutex<Vec<ModuleMetadata>>>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the lowest preference
    pub fn push(&self, metadata: ModuleMetadata) {
        self.lock().push(metadata);
    }

    /// Remove every record with `id`
    pub fn remove(&self, id: &str) {
        self.lock().retain(|m| m.id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ModuleMetadata>> {
        // A poisoned list is still a valid list
        self.modules.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModuleDiscovery for MemoryDiscovery {
    fn enumerate_all(&self) -> Vec<ModuleMetadata> {
        self.lock().clone()
    }
}

type SharedFactory = Arc<dyn Fn(&PluginOwner) -> Option<Box<dyn Plugin>> + Send + Sync>;

/// A module registered with [`MemoryModuleLoader`]
#[derive(Clone)]
struct MemoryModule {
    version: u32,
    factory: Option<SharedFactory>,
}

/// Loader resolving paths to modules registered in memory
#[derive(Clone, Default)]
pub struct MemoryModuleLoader {
    modules: Arc<Mutex<HashMap<PathBuf, MemoryModule>>>,
}

impl MemoryModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module built against the host's interface version
    pub fn register<F>(&self, path: impl Into<PathBuf>, factory: F)
    where
        F: Fn(&PluginOwner) -> Option<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        self.register_with_version(path, PLUGIN_API_VERSION, factory);
    }

    /// Register a module declaring an arbitrary interface version
    pub fn register_with_version<F>(&self, path: impl Into<PathBuf>, version: u32, factory: F)
    where
        F: Fn(&PluginOwner) -> Option<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        self.insert(
            path.into(),
            MemoryModule {
                version,
                factory: Some(Arc::new(factory)),
            },
        );
    }

    /// Register a module that exposes no factory entry point
    pub fn register_without_factory(&self, path: impl Into<PathBuf>) {
        self.insert(
            path.into(),
            MemoryModule {
                version: PLUGIN_API_VERSION,
                factory: None,
            },
        );
    }

    fn insert(&self, path: PathBuf, module: MemoryModule) {
        self.modules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, module);
    }
}

impl ModuleLoader for MemoryModuleLoader {
    fn resolve(&self, path: &Path) -> Result<ResolvedModule, PluginHostError> {
        let module = self
            .modules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| PluginHostError::ModuleResolve {
                path: path.to_path_buf(),
                reason: "no such module".to_string(),
            })?;

        let factory = module.factory.map(|factory| -> PluginFactoryFn {
            Box::new(move |owner: &PluginOwner| factory(owner))
        });
        Ok(ResolvedModule::new(module.version, factory))
    }
}
