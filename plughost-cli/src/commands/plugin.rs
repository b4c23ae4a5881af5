//! Plugin management commands

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use plughost_core::{
    DirectoryDiscovery, ManagerConfig, ModuleDiscovery, ModuleMetadata, NativeModuleLoader,
    PluginManager, PluginSettings, should_load,
};
use serde::Serialize;

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List discovered plugins and whether they load at startup
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the ids of every installable plugin
    Available {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a plugin by id and report the outcome
    Load {
        /// Plugin id
        id: String,
    },
    /// Run startup, then unload a plugin by id
    Unload {
        /// Plugin id
        id: String,
    },
    /// Enable a plugin at startup
    Enable {
        /// Plugin id
        id: String,
    },
    /// Disable a plugin at startup
    Disable {
        /// Plugin id
        id: String,
    },
    /// Drop the explicit setting for a plugin, restoring its default
    Reset {
        /// Plugin id
        id: String,
    },
}

/// Startup outcome of one plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Loaded,
    Disabled,
    Failed,
    Invalid,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Loaded => "✓",
            Status::Disabled => "○",
            Status::Failed | Status::Invalid => "✗",
        }
    }
}

#[derive(Debug, Serialize)]
struct PluginStatus {
    id: String,
    name: String,
    version: String,
    description: String,
    file: String,
    status: Status,
}

/// Run plugin command
pub fn run(args: PluginArgs, config: &ManagerConfig) -> Result<()> {
    match args.command {
        PluginCommands::List { json } => list_plugins(config, json),
        PluginCommands::Available { json } => available_plugins(config, json),
        PluginCommands::Load { id } => load_plugin(config, &id),
        PluginCommands::Unload { id } => unload_plugin(config, &id),
        PluginCommands::Enable { id } => set_enabled(config, &id, true),
        PluginCommands::Disable { id } => set_enabled(config, &id, false),
        PluginCommands::Reset { id } => reset_plugin(config, &id),
    }
}

/// The preferred record of every discovered id, with its startup outcome
fn collect_status(config: &ManagerConfig) -> Result<Vec<PluginStatus>> {
    let settings = PluginSettings::load(&config.settings_path)?;
    let manager = PluginManager::from_config(config);
    tracing::debug!(
        loaded = manager.plugin_count(),
        dirs = ?config.search_dirs(),
        "Collecting plugin status"
    );
    let discovery = DirectoryDiscovery::new(config.search_dirs());

    let mut seen = BTreeSet::new();
    let mut statuses: Vec<PluginStatus> = discovery
        .enumerate_all()
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .map(|m| {
            let status = if manager.is_loaded(&m.id) {
                Status::Loaded
            } else if !m.valid {
                Status::Invalid
            } else if should_load(&m, &settings) {
                Status::Failed
            } else {
                Status::Disabled
            };
            to_status(m, status)
        })
        .collect();
    statuses.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(statuses)
}

fn to_status(m: ModuleMetadata, status: Status) -> PluginStatus {
    PluginStatus {
        id: m.id,
        name: m.name,
        version: m.version,
        description: m.description,
        file: m.file.display().to_string(),
        status,
    }
}

fn list_plugins(config: &ManagerConfig, json: bool) -> Result<()> {
    let statuses = collect_status(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No plugins installed");
        println!();
        println!("Plugin directory: {}", config.user_plugin_dir.display());
        println!();
        println!("To install a plugin:");
        println!("  1. Create a module directory:  mkdir -p <plugin dir>/my-plugin");
        println!("  2. Add plugin.toml with at least: id = \"my-plugin\"");
        println!("  3. Copy the library next to it: cp libmy_plugin.so <plugin dir>/my-plugin/");
        println!("  4. Enable the plugin:           plughost plugin enable my-plugin");
        return Ok(());
    }

    for p in statuses {
        let description = if p.description.is_empty() {
            "No description"
        } else {
            &p.description
        };
        println!(
            "{} {} v{}    {}",
            p.status.symbol(),
            p.id,
            p.version,
            description
        );
    }

    Ok(())
}

fn available_plugins(config: &ManagerConfig, json: bool) -> Result<()> {
    let manager = PluginManager::empty(
        Box::new(DirectoryDiscovery::new(config.search_dirs())),
        Box::new(NativeModuleLoader),
    );
    let ids = manager.available_plugins();

    if json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in ids {
            println!("{}", id);
        }
    }
    Ok(())
}

fn load_plugin(config: &ManagerConfig, id: &str) -> Result<()> {
    let mut manager = PluginManager::from_config(config);
    if manager.is_loaded(id) {
        tracing::debug!(plugin = %id, "Plugin already loaded by startup");
        println!("Plugin already loaded at startup: {}", id);
        return Ok(());
    }
    if !manager.load_plugin(id) {
        bail!("Failed to load plugin '{}' (run with --verbose for details)", id);
    }
    println!("Loaded plugin: {}", id);
    Ok(())
}

fn unload_plugin(config: &ManagerConfig, id: &str) -> Result<()> {
    let mut manager = PluginManager::from_config(config);
    if !manager.is_loaded(id) {
        tracing::debug!(
            plugin = %id,
            loaded = ?manager.loaded_plugins(),
            "Unload target not registered"
        );
        println!("Plugin not loaded: {}", id);
        return Ok(());
    }
    manager.unload_plugin(id);
    println!("Unloaded plugin: {}", id);
    Ok(())
}

fn set_enabled(config: &ManagerConfig, id: &str, enabled: bool) -> Result<()> {
    let mut settings = PluginSettings::load(&config.settings_path)?;
    settings.set_enabled(id, enabled);
    settings.save(&config.settings_path)?;
    tracing::debug!(
        plugin = %id,
        enabled,
        path = %config.settings_path.display(),
        "Saved plugin setting"
    );

    if enabled {
        println!("Enabled plugin: {}", id);
        println!("Run 'plughost plugin list' to verify the plugin loads correctly.");
    } else {
        println!("Disabled plugin: {}", id);
    }
    Ok(())
}

fn reset_plugin(config: &ManagerConfig, id: &str) -> Result<()> {
    let mut settings = PluginSettings::load(&config.settings_path)?;
    if settings.clear(id) {
        settings.save(&config.settings_path)?;
        println!("Reset plugin to its default: {}", id);
    } else {
        println!("No setting stored for plugin: {}", id);
    }
    Ok(())
}
