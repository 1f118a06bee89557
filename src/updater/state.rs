//! Orchestrator state shared between continuations.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where the main check cycle currently is.
///
/// Auxiliary sub-cycles (IP check, geo databases, language) run beside this state
/// machine through their own slots; see
/// [`UpdateManager::active_slots`](super::UpdateManager::active_slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingSignature,
    AwaitingManifest,
    Deciding,
    AwaitingPackage,
    Installing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingSignature => "awaiting signature",
            Self::AwaitingManifest => "awaiting manifest",
            Self::Deciding => "deciding",
            Self::AwaitingPackage => "awaiting package",
            Self::Installing => "installing",
        };
        f.write_str(name)
    }
}

/// The package announced by the last verified manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpdate {
    pub url: String,
    pub hash: String,
    pub version: Option<String>,
}

/// Re-entrancy guard and bookkeeping of the package sub-cycle.
#[derive(Debug, Default)]
pub(super) struct CycleState {
    pub updating: bool,
    pub package_file: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub pending: Option<PendingUpdate>,
}
