//! The detached installer step.
//!
//! Started after the application exited with the command printed by `upkeep download`:
//!
//! ```bash
//! upkeep apply-update "/home/me/.upkeep/updates/ab12cd" "/opt/app"
//! ```
//!
//! Merges the staged tree over the installation. On failure, files already copied stay
//! in place.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::installer::apply_update;

#[derive(Args)]
pub struct ApplyUpdateCommand {
    /// Staging directory holding the extracted package
    source: PathBuf,

    /// Installation directory to merge into
    dest: PathBuf,

    /// Delete the staging directory after a successful merge
    #[arg(long)]
    remove_source: bool,
}

impl ApplyUpdateCommand {
    pub async fn execute(self) -> Result<()> {
        let source = self.source.clone();
        let dest = self.dest.clone();
        tokio::task::spawn_blocking(move || apply_update(&source, &dest)).await??;

        if self.remove_source {
            tokio::fs::remove_dir_all(&self.source).await.ok();
            info!("Removed {}", self.source.display());
        }

        println!("✅ Applied update from {} to {}", self.source.display(), self.dest.display());
        Ok(())
    }
}
