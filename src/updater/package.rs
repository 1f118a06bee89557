//! The package sub-cycle: download, integrity check and staging.

use super::{PendingUpdate, Phase, UpdateEvent, UpdateManager, lock, write_bytes};
use crate::constants::INTEGRITY_FAILURE_REASON;
use crate::core::UpkeepError;
use crate::download::{Download, SlotKind, Transport};
use crate::installer::extract_package;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Clears the package bookkeeping on every exit path of a package continuation.
struct CycleReset<'a, T: Transport> {
    manager: &'a UpdateManager<T>,
}

impl<T: Transport> Drop for CycleReset<'_, T> {
    fn drop(&mut self) {
        {
            let mut cycle = lock(&self.manager.inner.cycle);
            cycle.updating = false;
            cycle.package_file = None;
            cycle.executable = None;
        }
        self.manager.settle_phase(Phase::AwaitingPackage);
        self.manager.settle_phase(Phase::Installing);
    }
}

/// Staging directory name derived from the announced hash.
fn staging_name(hash: &str) -> String {
    let hash = hash.rsplit(':').next().unwrap_or(hash);
    hash.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_ascii_lowercase()
}

impl<T: Transport> UpdateManager<T> {
    /// Download, verify and stage the pending update for `executable`.
    ///
    /// # Errors
    ///
    /// [`UpkeepError::UpdateInProgress`] while another package cycle runs and
    /// [`UpkeepError::NoPendingUpdate`] when no verified manifest announced a package.
    pub fn try_download_update(&self, executable: impl Into<PathBuf>) -> Result<(), UpkeepError> {
        let executable = executable.into();
        let pending = {
            let mut cycle = lock(&self.inner.cycle);
            if cycle.updating {
                return Err(UpkeepError::UpdateInProgress);
            }
            let pending = cycle.pending.clone().ok_or(UpkeepError::NoPendingUpdate)?;
            cycle.updating = true;
            cycle.executable = Some(executable);
            pending
        };

        info!("Downloading update from {}", pending.url);
        self.set_phase(Phase::AwaitingPackage);

        let url = pending.url.clone();
        let this = self.clone();
        let started = self.inner.slots.start(SlotKind::Package, url, move |download| async move {
            this.on_package(download, pending).await;
        });

        if !started {
            let mut cycle = lock(&self.inner.cycle);
            cycle.updating = false;
            cycle.executable = None;
            drop(cycle);
            self.settle_phase(Phase::AwaitingPackage);
            return Err(UpkeepError::UpdateInProgress);
        }
        Ok(())
    }

    /// Like [`try_download_update`](Self::try_download_update), logging the refusal.
    pub fn download_update(&self, executable: impl Into<PathBuf>) -> bool {
        match self.try_download_update(executable) {
            Ok(()) => true,
            Err(e) => {
                debug!("Update download refused: {}", e);
                false
            }
        }
    }

    fn fail_update(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Update failed: {}", reason);
        self.emit(UpdateEvent::UpdateFailed {
            reason,
        });
    }

    async fn on_package(&self, download: Download, pending: PendingUpdate) {
        let _reset = CycleReset {
            manager: self,
        };

        if !download.is_usable() {
            self.fail_update(download.status);
            return;
        }

        let (archive, temp_dir, install_dir, fallback_exe) = {
            let settings = lock(&self.inner.settings);
            (
                settings.package_path(),
                settings.temp_dir.clone(),
                settings.install_dir(),
                settings.executable.clone(),
            )
        };
        let executable = lock(&self.inner.cycle).executable.clone().unwrap_or(fallback_exe);

        if let Err(e) = write_bytes(&archive, &download.bytes).await {
            self.fail_update(format!("Failed to write {}: {}", archive.display(), e));
            return;
        }
        lock(&self.inner.cycle).package_file = Some(archive.clone());

        let integrity = self.inner.integrity;
        let expected = pending.hash.clone();
        let path = archive.clone();
        let checked = tokio::task::spawn_blocking(move || integrity.check(&path, &expected)).await;

        let matches = match checked {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("{}", e);
                false
            }
            Err(e) => {
                warn!("Integrity check task failed: {}", e);
                false
            }
        };

        if !matches {
            remove_archive(&archive);
            self.fail_update(INTEGRITY_FAILURE_REASON);
            return;
        }

        self.set_phase(Phase::Installing);
        let staging = temp_dir.join(staging_name(&pending.hash));

        let source = archive.clone();
        let target = staging.clone();
        let staged = tokio::task::spawn_blocking(move || {
            if target.exists() {
                std::fs::remove_dir_all(&target).ok();
            }
            extract_package(&source, &target, &executable)
        })
        .await;

        remove_archive(&archive);

        match staged {
            Ok(Ok(executable)) => {
                info!("Update staged in {}", staging.display());
                self.emit(UpdateEvent::UpdateComplete {
                    executable,
                    install_command: format!(
                        "apply-update \"{}\" \"{}\"",
                        staging.display(),
                        install_dir.display()
                    ),
                });
            }
            Ok(Err(e)) => self.fail_update(format!("{e:#}")),
            Err(e) => self.fail_update(e.to_string()),
        }
    }
}

fn remove_archive(path: &Path) {
    if let Err(e) = crate::utils::fs::remove_file_if_exists(path) {
        warn!("{:#}", e);
    }
}
