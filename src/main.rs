//! Upkeep CLI entry point
//!
//! Parses arguments, runs the command and prints user-friendly errors:
//! - `check` / `watch` - Look for updates
//! - `download` - Stage the announced update
//! - `apply-update` - Install a staged update after the application exited
//! - `sign` / `verify` - Publisher tools for manifest signatures
//! - `clean-temp` - Remove leftover update files
//! - `config` - Manage global configuration

use anyhow::Result;
use clap::Parser;
use upkeep_cli::cli;
use upkeep_cli::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
