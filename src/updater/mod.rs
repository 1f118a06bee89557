//! The update orchestrator.
//!
//! [`UpdateManager`] drives a check cycle through a chain of slot continuations:
//!
//! ```text
//! Idle ─check_version─> AwaitingSignature ─> AwaitingManifest ─verify─> Deciding ─> Idle
//!                                                                         │
//!                                       download_update / auto_download ──┘
//!                                                 │
//!                                   AwaitingPackage ─hash ok─> Installing ─> Idle
//! ```
//!
//! Manifest bytes are verified against the detached signature before anything is
//! parsed; a forged or truncated manifest ends the cycle without an event. From
//! `Deciding` the auxiliary sub-cycles (IP check, geolocation databases, language
//! bundle) start through their own slots and run unordered beside the main cycle.
//!
//! # Examples
//!
//! ```rust,no_run
//! use upkeep_cli::config::{GlobalConfig, UpdateSettings};
//! use upkeep_cli::download::HttpTransport;
//! use upkeep_cli::updater::{UpdateEvent, UpdateManager};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! let transport = HttpTransport::from_config(&config.http)?;
//! let manager = UpdateManager::builder(transport, UpdateSettings::from_config(&config)?).build();
//!
//! let mut events = manager.subscribe();
//! manager.check_version(true);
//! manager.wait_idle().await;
//! while let Ok(event) = events.try_recv() {
//!     if let UpdateEvent::UpdateAvailable { version, .. } = event {
//!         println!("Version {version} is available");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod auxiliary;
mod events;
mod package;
mod state;


pub use events::UpdateEvent;
pub use state::{PendingUpdate, Phase};

use crate::config::UpdateSettings;
use crate::constants::{DEFAULT_BAD_VERSION_MESSAGE, RUNNING_BUILD};
use crate::download::{Download, SlotKind, SlotManager, Transport};
use crate::manifest::{Links, VersionManifest};
use crate::verify::{IntegrityChecker, SignatureVerifier};
use crate::version::BuildId;
use state::CycleState;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Title used when a manifest announces an update without one.
const DEFAULT_UPDATE_TITLE: &str = "New version available";

/// Locks a mutex, recovering the data if a continuation panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write a downloaded resource, creating its directory first.
async fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Orchestrates version checks, package downloads and auxiliary refreshes.
///
/// Cheap to clone; clones share all state.
pub struct UpdateManager<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for UpdateManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T: Transport> {
    slots: SlotManager<T>,
    verifier: SignatureVerifier,
    integrity: IntegrityChecker,
    running: BuildId,
    settings: Mutex<UpdateSettings>,
    links: Mutex<Links>,
    cycle: Mutex<CycleState>,
    /// Signature fetched for the manifest currently in flight.
    signature: Mutex<Vec<u8>>,
    phase: Mutex<Phase>,
    events: broadcast::Sender<UpdateEvent>,
}

/// Builder for [`UpdateManager`].
pub struct UpdateManagerBuilder<T: Transport> {
    transport: T,
    settings: UpdateSettings,
    running: Option<BuildId>,
    verifier: Option<SignatureVerifier>,
    links: Links,
    event_capacity: usize,
}

impl<T: Transport> UpdateManagerBuilder<T> {
    /// Build identifier of the running application. Defaults to this crate's version.
    pub fn running_build(mut self, build: BuildId) -> Self {
        self.running = Some(build);
        self
    }

    /// Verifier for manifest signatures. Defaults to the compiled-in key with the
    /// configured digest algorithm.
    pub fn verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Initial links, before any manifest is parsed.
    pub fn links(mut self, links: Links) -> Self {
        self.links = links;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> UpdateManager<T> {
        let algorithm = self.settings.digest_algorithm;
        let running = self.running.unwrap_or_else(|| {
            BuildId::parse_lenient(RUNNING_BUILD)
                .unwrap_or_else(|| BuildId::from_components(vec![0]))
        });
        let (events, _) = broadcast::channel(self.event_capacity);

        UpdateManager {
            inner: Arc::new(Inner {
                slots: SlotManager::new(self.transport),
                verifier: self.verifier.unwrap_or_else(|| SignatureVerifier::new(algorithm)),
                integrity: IntegrityChecker::new(algorithm),
                running,
                settings: Mutex::new(self.settings),
                links: Mutex::new(self.links),
                cycle: Mutex::new(CycleState::default()),
                signature: Mutex::new(Vec::new()),
                phase: Mutex::new(Phase::Idle),
                events,
            }),
        }
    }
}

impl<T: Transport> UpdateManager<T> {
    pub fn builder(transport: T, settings: UpdateSettings) -> UpdateManagerBuilder<T> {
        UpdateManagerBuilder {
            transport,
            settings,
            running: None,
            verifier: None,
            links: Links::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.inner.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.inner.phase)
    }

    /// Slots with a live fetch, including auxiliary sub-cycles.
    pub fn active_slots(&self) -> Vec<SlotKind> {
        self.inner.slots.active()
    }

    /// Resolves once no fetch is in flight and no continuation is running.
    pub async fn wait_idle(&self) {
        self.inner.slots.wait_idle().await;
    }

    pub fn links(&self) -> Links {
        lock(&self.inner.links).clone()
    }

    pub fn settings(&self) -> UpdateSettings {
        lock(&self.inner.settings).clone()
    }

    pub fn running_build(&self) -> &BuildId {
        &self.inner.running
    }

    /// The package announced by the last verified manifest.
    pub fn pending_update(&self) -> Option<PendingUpdate> {
        lock(&self.inner.cycle).pending.clone()
    }

    /// `true` while a package download or installation is running.
    pub fn is_updating(&self) -> bool {
        lock(&self.inner.cycle).updating
    }

    /// Start a check cycle by fetching the manifest signature.
    ///
    /// `manual` reports the result even when no newer build exists and keeps the
    /// discovered external IP out of the settings. Returns `false` when a check is
    /// already in flight.
    pub fn check_version(&self, manual: bool) -> bool {
        if self.inner.slots.is_busy(SlotKind::Signature)
            || self.inner.slots.is_busy(SlotKind::Manifest)
        {
            debug!("Version check already in progress");
            return false;
        }

        let url = lock(&self.inner.settings).signature_url();
        let this = self.clone();
        self.set_check_phase(Phase::AwaitingSignature);
        let started = self.inner.slots.start(SlotKind::Signature, url, move |download| async move {
            this.on_signature(download, manual);
        });

        if !started {
            self.settle_phase(Phase::AwaitingSignature);
        }
        started
    }

    /// Run automatic checks every `interval` until the handle is aborted.
    ///
    /// A tick is skipped while the last update notice is younger than `interval`. A zero
    /// interval disables periodic checks.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if interval.is_zero() {
                debug!("Periodic update checks disabled");
                return;
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if this.notice_is_recent(interval) {
                    debug!("Skipping automatic check, last notice is recent");
                    continue;
                }
                this.check_version(false);
            }
        })
    }

    fn notice_is_recent(&self, interval: Duration) -> bool {
        let Some(last) = lock(&self.inner.settings).last_update_notice else {
            return false;
        };
        let elapsed = chrono::Utc::now().timestamp().saturating_sub(last);
        u64::try_from(elapsed).is_ok_and(|secs| secs < interval.as_secs())
    }

    fn set_phase(&self, phase: Phase) {
        let mut current = lock(&self.inner.phase);
        if *current != phase {
            debug!("Update phase: {} -> {}", *current, phase);
            *current = phase;
        }
    }

    /// Advance a version check; a running package cycle keeps reporting its own phase.
    fn set_check_phase(&self, phase: Phase) {
        if lock(&self.inner.cycle).updating {
            debug!("Package cycle running, keeping its phase over {}", phase);
            return;
        }
        self.set_phase(phase);
    }

    /// Return to idle unless a later stage has taken over.
    fn settle_phase(&self, from: Phase) {
        let mut current = lock(&self.inner.phase);
        if *current == from {
            *current = Phase::Idle;
        }
    }

    fn emit(&self, event: UpdateEvent) {
        debug!("Emitting {} event", event.name());
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    fn emit_setting(&self, key: &str, value: impl Into<String>) {
        self.emit(UpdateEvent::SettingUpdated {
            key: key.to_string(),
            value: value.into(),
        });
    }

    fn on_signature(&self, download: Download, manual: bool) {
        if let Err(e) = download.ensure_usable() {
            warn!("Could not download version signature: {}", e);
            self.settle_phase(Phase::AwaitingSignature);
            return;
        }

        *lock(&self.inner.signature) = download.bytes;

        let url = lock(&self.inner.settings).manifest_url.clone();
        let this = self.clone();
        self.set_check_phase(Phase::AwaitingManifest);
        let started = self.inner.slots.start(SlotKind::Manifest, url, move |download| async move {
            this.on_manifest(download, manual);
        });
        if !started {
            self.settle_phase(Phase::AwaitingManifest);
        }
    }

    fn on_manifest(&self, download: Download, manual: bool) {
        let signature = std::mem::take(&mut *lock(&self.inner.signature));

        if let Err(e) = download.ensure_usable() {
            warn!("Could not download version data: {}", e);
            self.settle_phase(Phase::AwaitingManifest);
            return;
        }

        if !self.inner.verifier.verify(&download.bytes, &signature) {
            warn!("Could not verify version data");
            self.settle_phase(Phase::AwaitingManifest);
            return;
        }

        self.set_check_phase(Phase::Deciding);

        match VersionManifest::parse(&download.bytes) {
            Ok(manifest) => self.decide(&manifest, manual),
            Err(e) => warn!("Could not parse version data: {}", e),
        }

        self.start_auxiliary(manual);
        self.settle_phase(Phase::Deciding);
    }

    fn decide(&self, manifest: &VersionManifest, manual: bool) {
        let links = {
            let mut links = lock(&self.inner.links);
            if let Some(overrides) = &manifest.links {
                links.merge(overrides);
            }
            links.clone()
        };

        let package = manifest.package();
        let page_url =
            manifest.page_url().map_or_else(|| links.downloads.clone(), str::to_string);
        let package_url = package.map(|p| p.url.clone()).unwrap_or_default();

        lock(&self.inner.cycle).pending = package.and_then(|p| {
            p.hash.as_ref().map(|hash| PendingUpdate {
                url: p.url.clone(),
                hash: hash.clone(),
                version: manifest.version.clone(),
            })
        });

        let running = &self.inner.running;
        if let Some(advisory) = manifest.advisory_for(running) {
            warn!("Running build {} is flagged by the update server", running);
            self.emit(UpdateEvent::BadVersion {
                message: advisory.unwrap_or(DEFAULT_BAD_VERSION_MESSAGE).to_string(),
                url: page_url.clone(),
                update_url: package_url.clone(),
            });
        }

        let newer = manifest.build_id.as_ref().is_some_and(|remote| remote > running);
        if !newer && !manual {
            debug!("No newer build than {}", running);
            return;
        }

        let enabled = manifest.update_enabled();
        let version = manifest
            .version
            .clone()
            .or_else(|| manifest.build_id.as_ref().map(ToString::to_string))
            .unwrap_or_default();
        if newer {
            info!("Update available: {}", version);
        }

        self.emit(UpdateEvent::UpdateAvailable {
            title: manifest.title.clone().unwrap_or_else(|| DEFAULT_UPDATE_TITLE.to_string()),
            message: manifest.message.clone().unwrap_or_default(),
            version,
            url: if enabled { package_url } else { page_url },
            enabled,
        });

        let now = chrono::Utc::now().timestamp();
        let (auto_download, executable) = {
            let mut settings = lock(&self.inner.settings);
            settings.last_update_notice = Some(now);
            (settings.auto_download, settings.executable.clone())
        };
        self.emit_setting("update.last_update_notice", now.to_string());

        if newer && enabled && auto_download {
            debug!("Downloading update automatically");
            self.download_update(executable);
        }
    }

    fn start_auxiliary(&self, manual: bool) {
        let (check_ip, check_geo) = {
            let settings = lock(&self.inner.settings);
            (settings.ip_update && !settings.auto_detect_connection, settings.get_user_country)
        };

        if check_ip {
            self.check_ip(manual);
        }
        self.check_language();
        if check_geo {
            self.check_geo_updates();
        }
    }
}
