use anyhow::Result;
use clap::{Args, Subcommand};
use plughost_core::{ManagerConfig, PluginSettings};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show stored plugin settings
    Show,
    /// Show settings file and plugin directory paths
    Path,
}

pub fn run(args: ConfigArgs, config: &ManagerConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Path => show_paths(config),
    }
}

fn show_config(config: &ManagerConfig) -> Result<()> {
    let settings = PluginSettings::load(&config.settings_path)?;
    let toml_str = toml::to_string_pretty(&settings)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths(config: &ManagerConfig) -> Result<()> {
    println!("Settings:       {:?}", config.settings_path);
    println!("User plugins:   {:?}", config.user_plugin_dir);
    println!("Project plugins: {:?}", config.project_plugin_dir);
    Ok(())
}
