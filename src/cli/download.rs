//! Download, verify and stage the update announced by the server.
//!
//! Runs a manual check to learn the package URL and hash, then downloads the package,
//! verifies its hash and extracts it into a staging directory. The printed
//! `apply-update` command finishes the installation once the application has exited.
//! With `update.auto_download` set, the check itself stages the package and no second
//! download is started.

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

use super::common::{CommandContext, drain_events, print_event};
use crate::core::UpkeepError;
use crate::download::Transport;
use crate::updater::{UpdateEvent, UpdateManager};

#[derive(Args)]
pub struct DownloadCommand {
    /// Executable the update replaces [default: `update.executable` or this binary]
    executable: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

impl DownloadCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut context = CommandContext::load(config_path).await?;
        let executable =
            self.executable.unwrap_or_else(|| context.settings.executable.clone());
        let manager = context.manager()?;

        let mut events = Vec::new();
        if let Err(e) = stage_update(&manager, executable, &mut events).await {
            context.persist(&events).await?;
            return Err(e.into());
        }

        for event in &events {
            if !matches!(event, UpdateEvent::UpdateAvailable { .. }) || self.json {
                print_event(event, self.json)?;
            }
        }
        context.persist(&events).await?;

        if let Some(reason) = events.iter().find_map(|e| match e {
            UpdateEvent::UpdateFailed {
                reason,
            } => Some(reason),
            _ => None,
        }) {
            bail!("Update failed: {reason}");
        }
        Ok(())
    }
}

/// Run a manual check, then download the announced package unless the check already
/// finished a package cycle. Every event seen is appended to `events`.
async fn stage_update<T: Transport>(
    manager: &UpdateManager<T>,
    executable: PathBuf,
    events: &mut Vec<UpdateEvent>,
) -> Result<(), UpkeepError> {
    let mut rx = manager.subscribe();
    manager.check_version(true);
    manager.wait_idle().await;
    events.extend(drain_events(&mut rx));

    if package_cycle_finished(events) {
        return Ok(());
    }

    manager.try_download_update(executable)?;
    manager.wait_idle().await;
    events.extend(drain_events(&mut rx));
    Ok(())
}

fn package_cycle_finished(events: &[UpdateEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, UpdateEvent::UpdateComplete { .. } | UpdateEvent::UpdateFailed { .. }))
}
