//! Notifications emitted by the update orchestrator.

use serde::Serialize;
use std::path::PathBuf;

/// Everything an embedder can observe about update cycles.
///
/// Delivered over a `tokio::sync::broadcast` channel, see
/// [`UpdateManager::subscribe`](super::UpdateManager::subscribe). Serializes as a tagged
/// JSON object, e.g. `{"event":"update_failed","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A newer build exists, or a manual check finished.
    UpdateAvailable {
        title: String,
        message: String,
        version: String,
        /// The package URL when in-place updates are enabled, else the download page.
        url: String,
        enabled: bool,
    },

    /// The running build is flagged as broken or too old.
    BadVersion {
        message: String,
        url: String,
        update_url: String,
    },

    /// A verified package is staged. Run `install_command` with the staged executable
    /// after the host exits.
    UpdateComplete {
        executable: PathBuf,
        install_command: String,
    },

    UpdateFailed {
        reason: String,
    },

    /// A persisted setting changed; `key` uses the config file's `section.field` names.
    SettingUpdated {
        key: String,
        value: String,
    },

    GeoDatabaseUpdated {
        ipv6: bool,
        path: PathBuf,
    },

    /// A newer language bundle was written. It takes effect after a restart.
    LanguageUpdated {
        path: PathBuf,
    },
}

impl UpdateEvent {
    /// Short name used in log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UpdateAvailable { .. } => "update available",
            Self::BadVersion { .. } => "bad version",
            Self::UpdateComplete { .. } => "update complete",
            Self::UpdateFailed { .. } => "update failed",
            Self::SettingUpdated { .. } => "setting updated",
            Self::GeoDatabaseUpdated { .. } => "geo database updated",
            Self::LanguageUpdated { .. } => "language updated",
        }
    }
}
