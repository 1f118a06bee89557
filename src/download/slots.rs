//! Named download slots with at most one live fetch each.
//!
//! Each [`SlotKind`] owns one slot. [`SlotManager::start`] claims the slot atomically
//! through `DashMap`'s entry API, spawns a task that fetches the URL and hands the
//! [`Download`] to a single-use continuation. The slot is released by a drop guard after
//! the continuation returns, so a panicking continuation still frees it.
//!
//! Continuations are where pipelines chain: the signature continuation starts the
//! manifest slot, which in turn may start the package slot.

use super::transport::Transport;
use crate::core::UpkeepError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tracing::debug;

/// The fixed set of download slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SlotKind {
    Signature,
    Manifest,
    Package,
    IpCheck,
    GeoV4,
    GeoV6,
    LanguageCheck,
    LanguageFile,
}

impl SlotKind {
    pub const ALL: [Self; 8] = [
        Self::Signature,
        Self::Manifest,
        Self::Package,
        Self::IpCheck,
        Self::GeoV4,
        Self::GeoV6,
        Self::LanguageCheck,
        Self::LanguageFile,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Signature => "signature",
            Self::Manifest => "manifest",
            Self::Package => "package",
            Self::IpCheck => "ip-check",
            Self::GeoV4 => "geoip4",
            Self::GeoV6 => "geoip6",
            Self::LanguageCheck => "language-check",
            Self::LanguageFile => "language-file",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finished fetch as seen by a continuation.
#[derive(Debug, Clone)]
pub struct Download {
    pub slot: SlotKind,
    pub url: String,
    pub bytes: Vec<u8>,
    pub status: String,
    pub success: bool,
}

impl Download {
    /// None of the resources fetched through slots is legitimately empty.
    pub fn is_usable(&self) -> bool {
        self.success && !self.bytes.is_empty()
    }

    /// [`UpkeepError::NetworkError`] describing why the fetch is unusable.
    pub fn ensure_usable(&self) -> Result<(), UpkeepError> {
        if self.is_usable() {
            return Ok(());
        }
        let reason = if self.success { "empty response".to_string() } else { self.status.clone() };
        Err(UpkeepError::NetworkError {
            url: self.url.clone(),
            reason,
        })
    }
}

#[derive(Debug)]
struct SlotRecord {
    url: String,
    started: Instant,
}

#[derive(Debug, Default)]
struct Registry {
    slots: DashMap<SlotKind, SlotRecord>,
    idle: Notify,
}

/// Releases its slot when dropped, on every exit path of the fetch task.
struct SlotGuard {
    registry: Arc<Registry>,
    slot: SlotKind,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if let Some((_, record)) = self.registry.slots.remove(&self.slot) {
            debug!(
                "Released {} slot for {} after {:?}",
                self.slot,
                record.url,
                record.started.elapsed()
            );
        }
        if self.registry.slots.is_empty() {
            self.registry.idle.notify_waiters();
        }
    }
}

/// Owner of all download slots.
pub struct SlotManager<T> {
    registry: Arc<Registry>,
    transport: Arc<T>,
}

impl<T> Clone for SlotManager<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> SlotManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start fetching `url` on `slot` and run `on_complete` with the result.
    ///
    /// Returns `false` without side effects when the slot already has a live fetch.
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, slot: SlotKind, url: impl Into<String>, on_complete: F) -> bool
    where
        F: FnOnce(Download) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let url = url.into();

        match self.registry.slots.entry(slot) {
            Entry::Occupied(entry) => {
                debug!("{} slot busy with {}, ignoring {}", slot, entry.get().url, url);
                return false;
            }
            Entry::Vacant(entry) => {
                entry.insert(SlotRecord {
                    url: url.clone(),
                    started: Instant::now(),
                });
            }
        }

        debug!("Starting {} download: {}", slot, url);

        let guard = SlotGuard {
            registry: Arc::clone(&self.registry),
            slot,
        };
        let transport = Arc::clone(&self.transport);

        tokio::spawn(async move {
            let _guard = guard;
            let response = transport.fetch(&url).await;
            let download = Download {
                slot,
                url,
                bytes: response.bytes,
                status: response.status,
                success: response.success,
            };
            on_complete(download).await;
        });

        true
    }

    pub fn is_busy(&self, slot: SlotKind) -> bool {
        self.registry.slots.contains_key(&slot)
    }

    /// Slots with a live fetch, in declaration order.
    pub fn active(&self) -> Vec<SlotKind> {
        let mut active: Vec<SlotKind> = self.registry.slots.iter().map(|e| *e.key()).collect();
        active.sort();
        active
    }

    /// Resolves once no slot is occupied.
    ///
    /// Chained fetches keep the manager busy: a continuation claims its successor slot
    /// before its own slot is released.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.registry.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.registry.slots.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_occupied_slot_is_noop() {
        let transport = MockTransport::new();
        transport.respond("https://e/a", "first");
        let gate = transport.hold();
        let slots = SlotManager::new(transport.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        assert!(slots.start(SlotKind::Manifest, "https://e/a", move |d| async move {
            assert_eq!(d.bytes, b"first");
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let c = Arc::clone(&calls);
        assert!(!slots.start(SlotKind::Manifest, "https://e/b", move |_| async move {
            c.fetch_add(100, Ordering::SeqCst);
        }));
        assert!(slots.is_busy(SlotKind::Manifest));
        assert_eq!(slots.active(), vec![SlotKind::Manifest]);

        gate.open();
        slots.wait_idle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!slots.is_busy(SlotKind::Manifest));
        assert_eq!(transport.requests(), vec!["https://e/a".to_string()]);
    }

    #[tokio::test]
    async fn test_independent_slots_run_concurrently() {
        let transport = MockTransport::new();
        transport.respond("https://e/4", "v4");
        transport.respond("https://e/6", "v6");
        let slots = SlotManager::new(transport);
        let calls = Arc::new(AtomicUsize::new(0));

        for (slot, url) in [(SlotKind::GeoV4, "https://e/4"), (SlotKind::GeoV6, "https://e/6")] {
            let c = Arc::clone(&calls);
            assert!(slots.start(slot, url, move |d| async move {
                assert!(d.is_usable());
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        slots.wait_idle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_reaches_continuation() {
        let transport = MockTransport::new();
        let slots = SlotManager::new(transport);
        let seen = Arc::new(std::sync::Mutex::new(None));

        let s = Arc::clone(&seen);
        slots.start(SlotKind::IpCheck, "https://e/missing", move |d| async move {
            *s.lock().unwrap() = Some((d.success, d.is_usable(), d.status));
        });
        slots.wait_idle().await;

        let (success, usable, status) = seen.lock().unwrap().clone().unwrap();
        assert!(!success);
        assert!(!usable);
        assert!(status.contains("404"));
    }

    #[tokio::test]
    async fn test_slot_released_after_panicking_continuation() {
        let transport = MockTransport::new();
        transport.respond("https://e/p", "x");
        let slots = SlotManager::new(transport);

        async fn explode(_: Download) {
            panic!("continuation failure");
        }

        slots.start(SlotKind::Package, "https://e/p", explode);
        tokio::time::timeout(Duration::from_secs(5), slots.wait_idle()).await.unwrap();

        assert!(!slots.is_busy(SlotKind::Package));
        assert!(slots.start(SlotKind::Package, "https://e/p", |_| async {}));
        slots.wait_idle().await;
    }

    #[tokio::test]
    async fn test_chained_start_keeps_manager_busy() {
        let transport = MockTransport::new();
        transport.respond("https://e/sig", "sig");
        transport.respond("https://e/xml", "xml");
        let slots = SlotManager::new(transport);
        let finished = Arc::new(AtomicUsize::new(0));

        let chain = slots.clone();
        let f = Arc::clone(&finished);
        slots.start(SlotKind::Signature, "https://e/sig", move |_| async move {
            let f2 = Arc::clone(&f);
            assert!(chain.start(SlotKind::Manifest, "https://e/xml", move |d| async move {
                assert_eq!(d.bytes, b"xml");
                f2.fetch_add(1, Ordering::SeqCst);
            }));
            f.fetch_add(1, Ordering::SeqCst);
        });

        slots.wait_idle().await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_slot_names_are_unique() {
        let mut names: Vec<&str> = SlotKind::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SlotKind::ALL.len());
    }

    #[test]
    fn test_unusable_download_reports_network_error() {
        let download = |success: bool, bytes: &[u8], status: &str| Download {
            slot: SlotKind::Manifest,
            url: "https://e/xml".to_string(),
            bytes: bytes.to_vec(),
            status: status.to_string(),
            success,
        };

        assert!(download(true, b"x", "200 OK").ensure_usable().is_ok());
        match download(false, b"", "503 Service Unavailable").ensure_usable() {
            Err(UpkeepError::NetworkError { url, reason }) => {
                assert_eq!(url, "https://e/xml");
                assert_eq!(reason, "503 Service Unavailable");
            }
            other => panic!("expected NetworkError, got {other:?}"),
        }
        assert!(matches!(
            download(true, b"", "200 OK").ensure_usable(),
            Err(UpkeepError::NetworkError { reason, .. }) if reason == "empty response"
        ));
    }
}
