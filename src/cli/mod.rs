//! Command-line interface for Upkeep.
//!
//! # Available Commands
//!
//! ## Updating
//! - `check` - Fetch and verify the manifest, report available updates
//! - `watch` - Check periodically until interrupted
//! - `download` - Download, verify and stage the announced package
//! - `apply-update` - Merge a staged package into the installation (detached installer)
//! - `clean-temp` - Remove leftover downloads
//!
//! ## Publishing
//! - `sign` - Sign a manifest with the publisher key
//! - `verify` - Check a detached manifest signature
//!
//! ## System
//! - `config` - Show, locate or initialise the global configuration
//!
//! # Typical Flow
//!
//! ```bash
//! upkeep check
//! upkeep download
//! # after the application exits:
//! upkeep apply-update "<staging dir>" "<install dir>"
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress log output, errors are still printed
//! - `--config` - Path to a custom config file
//!
//! Log output goes to stderr, so `--json` event streams on stdout stay parseable.

mod apply_update;
mod check;
mod clean_temp;
pub mod common;
mod config;
mod download;
mod sign;
mod verify;
mod watch;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration for CLI execution.
///
/// Built from the parsed flags by [`Cli::build_config`]; tests and embedders can
/// construct one directly and pass it to [`Cli::execute_with_config`].
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the log subscriber, e.g. `"debug"`.
    ///
    /// Ignored when `RUST_LOG` is set. `None` installs no subscriber.
    pub log_level: Option<String>,

    /// Custom path to the global configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global `tracing` subscriber. Only the first call has an effect.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "upkeep",
    about = "Upkeep - signed self-update pipeline",
    version,
    long_about = "Upkeep checks a signed version manifest, downloads and verifies update packages, \
                  and installs them once the application has exited."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress log output; errors are still printed
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom global configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the update server for a newer build
    Check(check::CheckCommand),

    /// Check periodically and print events until interrupted
    Watch(watch::WatchCommand),

    /// Download, verify and stage the announced update
    Download(download::DownloadCommand),

    /// Sign a version manifest (publisher tool)
    Sign(sign::SignCommand),

    /// Verify a detached manifest signature
    Verify(verify::VerifyCommand),

    /// Merge a staged update into the installation directory
    ApplyUpdate(apply_update::ApplyUpdateCommand),

    /// Remove downloaded and staged update files
    CleanTemp(clean_temp::CleanTempCommand),

    /// Manage the global configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the command described by the parsed arguments.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` selects `debug`, `--quiet` turns logging off, otherwise `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "off"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration instead of the parsed global flags.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let config_path = config.config_path;

        match self.command {
            Commands::Check(cmd) => cmd.execute(config_path).await,
            Commands::Watch(cmd) => cmd.execute(config_path).await,
            Commands::Download(cmd) => cmd.execute(config_path).await,
            Commands::Sign(cmd) => cmd.execute(),
            Commands::Verify(cmd) => cmd.execute().await,
            Commands::ApplyUpdate(cmd) => cmd.execute().await,
            Commands::CleanTemp(cmd) => cmd.execute(config_path).await,
            Commands::Config(cmd) => cmd.execute(config_path).await,
        }
    }
}
