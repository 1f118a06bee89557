//! Remove leftover downloads and staged files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::installer::clean_temp_files;

#[derive(Args)]
pub struct CleanTempCommand {
    /// Directory to clean [default: the configured update directory]
    dir: Option<PathBuf>,
}

impl CleanTempCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let dir = match self.dir {
            Some(dir) => dir,
            None => CommandContext::load(config_path).await?.settings.temp_dir,
        };

        let target = dir.clone();
        tokio::task::spawn_blocking(move || clean_temp_files(&target)).await?;

        println!("Cleaned {}", dir.display());
        Ok(())
    }
}
