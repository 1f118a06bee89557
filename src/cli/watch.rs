//! Keep checking for updates in the foreground.
//!
//! Checks once at startup (unless `update.check_on_startup` is off), then every
//! `update.check_interval` seconds, printing events as they arrive until interrupted.
//! With `update.auto_download` enabled, newer builds are staged automatically.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::common::{CommandContext, print_event};

#[derive(Args)]
pub struct WatchCommand {
    /// Seconds between checks, overriding `update.check_interval`
    #[arg(long)]
    interval: Option<u64>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

impl WatchCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut context = CommandContext::load(config_path).await?;
        let manager = context.manager()?;
        let interval =
            self.interval.map_or(context.settings.check_interval, Duration::from_secs);

        let mut rx = manager.subscribe();
        if context.config.update.check_on_startup {
            manager.check_version(false);
        }
        let periodic = manager.spawn_periodic(interval);
        info!("Watching for updates every {:?}", interval);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        print_event(&event, self.json)?;
                        if let Err(e) = context.persist(std::slice::from_ref(&event)).await {
                            warn!("{:#}", e);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => warn!("Dropped {} update events", missed),
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    break;
                }
            }
        }

        periodic.abort();
        Ok(())
    }
}
