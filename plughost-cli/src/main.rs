use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use plughost_core::ManagerConfig;

mod commands;

#[derive(Parser)]
#[command(name = "plughost", about = "Discover, load and manage host plugins")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// User plugin directory (default: ~/.config/plughost/plugins)
    #[arg(long, global = true, value_name = "DIR")]
    plugin_dir: Option<PathBuf>,

    /// Settings file (default: ~/.config/plughost/plughost.toml)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage enablement settings
    Config(commands::config::ConfigArgs),
    /// Manage plugins
    Plugin(commands::plugin::PluginArgs),
}

impl Cli {
    /// Manager configuration with command-line overrides applied
    fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        if let Some(dir) = &self.plugin_dir {
            config.user_plugin_dir = dir.clone();
        }
        if let Some(path) = &self.settings {
            config.settings_path = path.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.manager_config();

    match cli.command {
        Commands::Config(args) => commands::config::run(args, &config),
        Commands::Plugin(args) => commands::plugin::run(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_overrides_reach_config() {
        let cli = Cli::parse_from([
            "plughost",
            "plugin",
            "list",
            "--plugin-dir",
            "/tmp/plugins",
            "--settings",
            "/tmp/plughost.toml",
        ]);

        let config = cli.manager_config();
        assert_eq!(config.user_plugin_dir, PathBuf::from("/tmp/plugins"));
        assert_eq!(config.settings_path, PathBuf::from("/tmp/plughost.toml"));
    }

    #[test]
    fn test_defaults_without_overrides() {
        let cli = Cli::parse_from(["plughost", "-v", "config", "path"]);
        assert!(cli.verbose);

        let config = cli.manager_config();
        assert!(config.user_plugin_dir.ends_with("plughost/plugins"));
    }
}
