//! Loader - turns module metadata into a live plugin instance

use libloading::Library;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use tokio::sync::mpsc::UnboundedSender;

use plughost_api::{CREATE_SYMBOL, LifecycleEvent, Plugin, PluginOwner, VERSION_SYMBOL};

use super::discovery::ModuleMetadata;
use super::error::PluginHostError;
use super::version::check_version;

/// Factory entry point of a resolved module
pub type PluginFactoryFn = Box<dyn FnOnce(&PluginOwner) -> Option<Box<dyn Plugin>>>;

/// Signature of the exported create symbol
type CreateFn = extern "C-unwind" fn(*const PluginOwner) -> *mut dyn Plugin;

/// Signature of the exported version symbol
type VersionFn = extern "C-unwind" fn() -> u32;

/// A module resolved from its backing file, not yet instantiated
pub struct ResolvedModule {
    /// Declared plugin interface version
    pub version: u32,
    /// Factory entry point, if the module exposes one
    pub factory: Option<PluginFactoryFn>,
    /// Native library backing the factory; must outlive the instance
    library: Option<Library>,
}

impl ResolvedModule {
    /// A module that lives in the host process (no native library)
    pub fn new(version: u32, factory: Option<PluginFactoryFn>) -> Self {
        Self {
            version,
            factory,
            library: None,
        }
    }
}

/// Resolves a module file to its version and factory
pub trait ModuleLoader {
    fn resolve(&self, path: &Path) -> Result<ResolvedModule, PluginHostError>;
}

/// Loads modules as native dynamic libraries
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeModuleLoader;

impl ModuleLoader for NativeModuleLoader {
    fn resolve(&self, path: &Path) -> Result<ResolvedModule, PluginHostError> {
        // SAFETY: Loading a library runs its initializers. Only modules found
        // in the configured plugin directories get here.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginHostError::ModuleResolve {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: the symbol is declared with this signature by `export_plugin!`.
        // A module without it has no declared version and never passes the gate.
        let version = match unsafe { library.get::<VersionFn>(VERSION_SYMBOL) } {
            Ok(version_fn) => version_fn(),
            Err(_) => 0,
        };

        // SAFETY: as above. The copied fn pointer is only called while the
        // library is alive: the library moves into the LoadedPlugin.
        let create_fn = unsafe { library.get::<CreateFn>(CREATE_SYMBOL) }
            .ok()
            .map(|symbol| *symbol);

        let factory = create_fn.map(|create_fn| -> PluginFactoryFn {
            Box::new(move |owner: &PluginOwner| {
                let ptr = create_fn(owner as *const PluginOwner);
                if ptr.is_null() {
                    None
                } else {
                    // SAFETY: non-null pointers come from Box::into_raw in the module.
                    Some(unsafe { Box::from_raw(ptr) })
                }
            })
        });

        Ok(ResolvedModule {
            version,
            factory,
            library: Some(library),
        })
    }
}

/// A registered plugin instance and what keeps it alive
///
/// Dropping it destroys the instance: `on_unload` runs, the instance is
/// dropped before its library, and a single [`LifecycleEvent::Destroyed`]
/// goes to the manager.
pub struct LoadedPlugin {
    id: String,
    serial: u64,
    instance: Option<Box<dyn Plugin>>,
    events: UnboundedSender<LifecycleEvent>,
    _library: Option<Library>,
}

impl LoadedPlugin {
    /// Registry key of this plugin
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Serial of the load that produced this instance
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        let Some(mut instance) = self.instance.take() else {
            return;
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| instance.on_unload())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(plugin = %self.id, error = %e, "Plugin on_unload returned error");
            }
            Err(_) => {
                tracing::error!(plugin = %self.id, "Plugin panicked in on_unload");
            }
        }
        drop(instance);

        let event = LifecycleEvent::Destroyed {
            id: self.id.clone(),
            serial: self.serial,
        };
        if self.events.send(event).is_err() {
            tracing::trace!(plugin = %self.id, "Manager gone, destroy notification dropped");
        }
    }
}

/// Reject metadata that cannot be loaded at all
pub fn validate_metadata(metadata: &ModuleMetadata) -> Result<(), PluginHostError> {
    if metadata.id.is_empty() {
        return Err(PluginHostError::InvalidMetadata {
            id: metadata.id.clone(),
            reason: "empty plugin id".to_string(),
        });
    }
    if !metadata.valid {
        return Err(PluginHostError::InvalidMetadata {
            id: metadata.id.clone(),
            reason: format!("no usable manifest or library at {}", metadata.file.display()),
        });
    }
    Ok(())
}

/// Load one module: validate, resolve, gate on version, construct.
///
/// Each step is a distinct failure; nothing is instantiated unless every
/// earlier step passed.
pub fn load(
    metadata: &ModuleMetadata,
    loader: &dyn ModuleLoader,
    serial: u64,
    events: UnboundedSender<LifecycleEvent>,
) -> Result<LoadedPlugin, PluginHostError> {
    validate_metadata(metadata)?;
    let id = metadata.id.clone();

    let ResolvedModule {
        version,
        factory,
        library,
    } = loader.resolve(&metadata.file)?;
    check_version(&id, version)?;

    let factory = factory.ok_or_else(|| PluginHostError::NoFactory { id: id.clone() })?;

    let owner = PluginOwner::new(id.clone(), serial, events.clone());
    let created = std::panic::catch_unwind(AssertUnwindSafe(|| factory(&owner)));
    let mut instance = match created {
        Ok(Some(instance)) => instance,
        Ok(None) => {
            return Err(PluginHostError::ConstructionFailed {
                id,
                reason: "factory returned no instance".to_string(),
            });
        }
        Err(_) => {
            return Err(PluginHostError::ConstructionFailed {
                id,
                reason: "factory panicked".to_string(),
            });
        }
    };

    if let Err(e) = instance.on_load(&owner) {
        drop(instance);
        return Err(PluginHostError::ConstructionFailed {
            id,
            reason: e.to_string(),
        });
    }

    Ok(LoadedPlugin {
        id,
        serial,
        instance: Some(instance),
        events,
        _library: library,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plughost_api::{PLUGIN_API_VERSION, PluginError};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recording {
        journal: Journal,
        fail_load: bool,
    }

    impl Plugin for Recording {
        fn on_load(&mut self, _owner: &PluginOwner) -> Result<(), PluginError> {
            self.journal.lock().unwrap().push("load".to_string());
            if self.fail_load {
                return Err(PluginError::unavailable("no compositor"));
            }
            Ok(())
        }

        fn on_unload(&mut self) -> Result<(), PluginError> {
            self.journal.lock().unwrap().push("unload".to_string());
            Ok(())
        }
    }

    impl Drop for Recording {
        fn drop(&mut self) {
            self.journal.lock().unwrap().push("drop".to_string());
        }
    }

    /// Loader returning one fixed module for any path
    struct FixedLoader {
        version: u32,
        has_factory: bool,
        builds: bool,
        fail_load: bool,
        journal: Journal,
    }

    impl FixedLoader {
        fn new() -> Self {
            Self {
                version: PLUGIN_API_VERSION,
                has_factory: true,
                builds: true,
                fail_load: false,
                journal: Arc::default(),
            }
        }
    }

    impl ModuleLoader for FixedLoader {
        fn resolve(&self, _path: &Path) -> Result<ResolvedModule, PluginHostError> {
            let journal = self.journal.clone();
            let builds = self.builds;
            let fail_load = self.fail_load;
            let factory: Option<PluginFactoryFn> = self.has_factory.then(|| -> PluginFactoryFn {
                Box::new(move |_owner: &PluginOwner| {
                    builds.then(|| {
                        Box::new(Recording { journal, fail_load }) as Box<dyn Plugin>
                    })
                })
            });
            Ok(ResolvedModule::new(self.version, factory))
        }
    }

    fn metadata(id: &str) -> ModuleMetadata {
        ModuleMetadata {
            id: id.to_string(),
            file: PathBuf::from(format!("/plugins/{id}/lib{id}.so")),
            valid: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut meta = metadata("foo");
        meta.valid = false;

        let err = load(&meta, &FixedLoader::new(), 1, tx).err().unwrap();
        assert!(matches!(err, PluginHostError::InvalidMetadata { .. }));
    }

    #[test]
    fn test_empty_id_rejected() {
        let meta = ModuleMetadata {
            valid: true,
            ..Default::default()
        };
        assert!(matches!(
            validate_metadata(&meta),
            Err(PluginHostError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_never_constructs() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let loader = FixedLoader {
            version: PLUGIN_API_VERSION + 1,
            ..FixedLoader::new()
        };

        let err = load(&metadata("foo"), &loader, 1, tx).err().unwrap();
        assert!(matches!(err, PluginHostError::VersionMismatch { .. }));
        assert!(loader.journal.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_factory() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let loader = FixedLoader {
            has_factory: false,
            ..FixedLoader::new()
        };

        let err = load(&metadata("foo"), &loader, 1, tx).err().unwrap();
        assert!(matches!(err, PluginHostError::NoFactory { id } if id == "foo"));
    }

    #[test]
    fn test_factory_returning_nothing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let loader = FixedLoader {
            builds: false,
            ..FixedLoader::new()
        };

        let err = load(&metadata("foo"), &loader, 1, tx).err().unwrap();
        assert!(matches!(err, PluginHostError::ConstructionFailed { .. }));
    }

    #[test]
    fn test_failed_on_load_drops_without_unload() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = FixedLoader {
            fail_load: true,
            ..FixedLoader::new()
        };

        let err = load(&metadata("foo"), &loader, 1, tx).err().unwrap();
        assert!(matches!(
            err,
            PluginHostError::ConstructionFailed { reason, .. } if reason.contains("no compositor")
        ));
        assert_eq!(*loader.journal.lock().unwrap(), vec!["load", "drop"]);
        // Never registered, so no destroy notification either
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_notifies_exactly_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = FixedLoader::new();

        let plugin = load(&metadata("foo"), &loader, 42, tx).unwrap();
        assert_eq!(plugin.id(), "foo");
        assert_eq!(plugin.serial(), 42);
        drop(plugin);

        assert_eq!(
            *loader.journal.lock().unwrap(),
            vec!["load", "unload", "drop"]
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            LifecycleEvent::Destroyed {
                id: "foo".to_string(),
                serial: 42
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_native_loader_reports_unresolvable_module() {
        let err = NativeModuleLoader
            .resolve(Path::new("/nonexistent/libnothing.so"))
            .err()
            .unwrap();
        assert!(matches!(err, PluginHostError::ModuleResolve { .. }));
    }
}
