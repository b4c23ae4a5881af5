//! plughost-api - Plugin API for the plughost plugin manager
//!
//! This crate provides the traits and types needed to write plugins that the
//! host discovers and loads at runtime. Plugins are native Rust dynamic
//! libraries shipped in their own directory next to a `plugin.toml` manifest.
//!
//! # Example
//!
//! ```ignore
//! use plughost_api::{export_plugin, Plugin, PluginError, PluginFactory, PluginOwner};
//!
//! pub struct MyPlugin {
//!     owner: PluginOwner,
//! }
//!
//! impl Plugin for MyPlugin {
//!     fn on_load(&mut self, owner: &PluginOwner) -> Result<(), PluginError> {
//!         owner.log_info("Plugin loaded!");
//!         Ok(())
//!     }
//! }
//!
//! impl PluginFactory for MyPlugin {
//!     fn create(owner: &PluginOwner) -> Option<Self> {
//!         Some(Self { owner: owner.clone() })
//!     }
//! }
//!
//! export_plugin!(MyPlugin);
//! ```

pub mod error;
pub mod owner;
pub mod types;

pub use error::PluginError;
pub use owner::{LifecycleEvent, PluginOwner};
pub use types::{MANIFEST_FILE, ModuleManifest};

/// Current plugin interface version. Plugins must match this exactly.
///
/// The interface is a binary contract, so there is no compatibility range.
pub const PLUGIN_API_VERSION: u32 = 1;

/// Exported symbol returning the interface version a module was built with.
pub const VERSION_SYMBOL: &[u8] = b"_plughost_plugin_api_version";

/// Exported symbol constructing a plugin instance.
pub const CREATE_SYMBOL: &[u8] = b"_plughost_plugin_create";

/// A loaded plugin instance.
///
/// The host treats plugins as opaque: it constructs them, owns them while
/// they are registered and drops them on unload. Whatever a plugin does in
/// between is up to the plugin.
pub trait Plugin: Send {
    /// Called right after construction, before the instance is registered.
    ///
    /// Returning an error aborts the load; the instance is dropped without
    /// ever becoming visible to the host.
    fn on_load(&mut self, _owner: &PluginOwner) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called exactly once, right before the instance is dropped.
    fn on_unload(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Constructor used by [`export_plugin!`].
///
/// Returning `None` reports a failed construction to the host.
pub trait PluginFactory: Plugin + Sized {
    fn create(owner: &PluginOwner) -> Option<Self>;
}

/// Export a plugin type for dynamic loading.
///
/// The type must implement [`PluginFactory`].
///
/// # Generated Functions
///
/// - `_plughost_plugin_api_version()`: Returns [`PLUGIN_API_VERSION`]
/// - `_plughost_plugin_create(owner)`: Creates a plugin instance, or returns
///   a null pointer when the factory declines
///
/// Both use the `"C-unwind"` ABI, so a panicking factory unwinds into the
/// host, which reports a failed construction instead of aborting.
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C-unwind" fn _plughost_plugin_create(
            owner: *const $crate::PluginOwner,
        ) -> *mut dyn $crate::Plugin {
            // SAFETY: the host passes a pointer to an owner that outlives this call.
            let owner = unsafe { owner.as_ref() };
            match owner.and_then(<$plugin_type as $crate::PluginFactory>::create) {
                Some(plugin) => {
                    let plugin: Box<dyn $crate::Plugin> = Box::new(plugin);
                    Box::into_raw(plugin)
                }
                None => ::std::ptr::null_mut::<$plugin_type>() as *mut dyn $crate::Plugin,
            }
        }

        #[unsafe(no_mangle)]
        pub extern "C-unwind" fn _plughost_plugin_api_version() -> u32 {
            $crate::PLUGIN_API_VERSION
        }
    };
}
