//! Check the update server for a newer build.
//!
//! Runs one full cycle: fetch the signature, fetch and verify the manifest, report
//! advisories and available updates, then run the configured auxiliary refreshes.
//! Settings discovered along the way (last notice time, external IP, language
//! version) are written back to the global config.
//!
//! # Examples
//!
//! ```bash
//! upkeep check            # report only newer builds
//! upkeep check --manual   # always report the server's build
//! upkeep check --json     # one JSON object per event
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::common::{CommandContext, drain_events, print_event};
use crate::updater::UpdateEvent;

#[derive(Args)]
pub struct CheckCommand {
    /// Report the server's build even when it is not newer
    #[arg(long)]
    manual: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

impl CheckCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut context = CommandContext::load(config_path).await?;
        let manager = context.manager()?;

        let mut rx = manager.subscribe();
        manager.check_version(self.manual);
        manager.wait_idle().await;
        let events = drain_events(&mut rx);

        for event in &events {
            print_event(event, self.json)?;
        }

        let announced = events.iter().any(|e| {
            matches!(e, UpdateEvent::UpdateAvailable { .. } | UpdateEvent::BadVersion { .. })
        });
        if !announced && !self.json {
            println!("No update available (running {})", manager.running_build());
        }

        context.persist(&events).await
    }
}
