//! Hello Plugin - A simple example plugin for plughost
//!
//! This plugin demonstrates:
//! - Exporting entry points with the `export_plugin!` macro
//! - Declining construction from `PluginFactory::create`
//! - Handling lifecycle hooks (`on_load`, `on_unload`)
//! - Asking the host to destroy the plugin through its owner
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! mkdir -p ~/.config/plughost/plugins/hello
//! cp plugin.toml ~/.config/plughost/plugins/hello/
//! cp target/release/libhello_plugin.so ~/.config/plughost/plugins/hello/
//! plughost plugin list
//! ```
//!
//! Set `HELLO_PLUGIN_DECLINE` to make the factory refuse construction, or
//! `HELLO_PLUGIN_UNAVAILABLE` to have the plugin request its own removal
//! right after loading.

use plughost_api::{Plugin, PluginError, PluginFactory, PluginOwner, export_plugin};

/// A plugin that greets on load and says goodbye on unload.
pub struct HelloPlugin {
    owner: PluginOwner,
    greeting: String,
}

impl PluginFactory for HelloPlugin {
    fn create(owner: &PluginOwner) -> Option<Self> {
        if std::env::var_os("HELLO_PLUGIN_DECLINE").is_some() {
            owner.log_warn("Construction declined");
            return None;
        }

        Some(Self {
            owner: owner.clone(),
            greeting: format!("Hello from {}!", owner.plugin_id()),
        })
    }
}

impl Plugin for HelloPlugin {
    fn on_load(&mut self, owner: &PluginOwner) -> Result<(), PluginError> {
        owner.log_info(&self.greeting);

        if std::env::var_os("HELLO_PLUGIN_UNAVAILABLE").is_some() {
            owner.log_warn("Backing service unavailable, requesting removal");
            self.owner.request_destroy();
        }
        Ok(())
    }

    fn on_unload(&mut self) -> Result<(), PluginError> {
        self.owner.log_info("Goodbye!");
        Ok(())
    }
}

export_plugin!(HelloPlugin);
