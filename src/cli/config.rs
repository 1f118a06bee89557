//! Manage the global Upkeep configuration.
//!
//! ```bash
//! upkeep config          # same as `config show`
//! upkeep config show
//! upkeep config path
//! upkeep config init [--force]
//! ```
//!
//! The file lives at `~/.upkeep/config.toml` (`%LOCALAPPDATA%\upkeep\config.toml` on
//! Windows) unless `--config` or `UPKEEP_CONFIG_PATH` points elsewhere.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a starting configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    fn resolve(config_path: Option<PathBuf>) -> Result<PathBuf> {
        match config_path {
            Some(path) => Ok(path),
            None => GlobalConfig::default_path(),
        }
    }

    async fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = Self::resolve(config_path)?;

        if config_path.exists() && !force {
            println!("❌ Global config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = GlobalConfig::init_example();
        config.save_to(&config_path).await?;

        println!("✅ Created global config at: {}", config_path.display());
        println!("\n{}", "Configuration:".bold());
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }

    async fn show(config_path: Option<PathBuf>) -> Result<()> {
        let config_path = Self::resolve(config_path)?;
        let config = GlobalConfig::load_with_optional(Some(config_path.clone())).await?;

        println!("{}", "Global Configuration".bold());
        if config_path.exists() {
            println!("Location: {}\n", config_path.display());
        } else {
            println!("Location: {} {}\n", config_path.display(), "(not created, defaults)".dimmed());
        }
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        println!("{}", Self::resolve(config_path)?.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_init_respects_force() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("nested/config.toml");

        ConfigCommand::init(false, Some(config_path.clone())).await.unwrap();
        let created = GlobalConfig::load_from(&config_path).await.unwrap();
        assert_eq!(created, GlobalConfig::init_example());

        let mut edited = created.clone();
        edited.update.auto_download = true;
        edited.save_to(&config_path).await.unwrap();

        // Without --force the file is kept
        ConfigCommand::init(false, Some(config_path.clone())).await.unwrap();
        assert!(GlobalConfig::load_from(&config_path).await.unwrap().update.auto_download);

        ConfigCommand::init(true, Some(config_path.clone())).await.unwrap();
        assert!(!GlobalConfig::load_from(&config_path).await.unwrap().update.auto_download);
    }

    #[tokio::test]
    async fn test_config_show_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(ConfigCommand::show(Some(temp.path().join("config.toml"))).await.is_ok());
    }

    #[test]
    fn test_config_path() {
        let path = PathBuf::from("/tmp/upkeep/config.toml");
        assert!(ConfigCommand::show_path(Some(path)).is_ok());
    }
}
