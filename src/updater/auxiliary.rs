//! Auxiliary sub-cycles started after a version check: external IP, geolocation
//! databases and the language bundle.
//!
//! Each runs through its own slot, so a busy slot turns a repeated request into a
//! no-op. Failures are logged and never affect the main cycle.

use super::{UpdateEvent, UpdateManager, lock, write_bytes};
use crate::constants::LANGUAGE_VERSION_SCRIPT;
use crate::download::{Download, SlotKind, Transport};
use crate::utils::fs::is_fresh_file;
use crate::version::BuildId;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// First dotted-quad IPv4 address in `text`.
fn extract_ipv4(text: &str) -> Option<String> {
    let re = Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
    )
    .ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

impl<T: Transport> UpdateManager<T> {
    /// Look up the external IPv4 address at `links.ipcheck`.
    ///
    /// Emits `SettingUpdated("connection.external_ip")` with the address, or an empty
    /// value when none was found. A manual check does not store the address.
    pub fn check_ip(&self, manual: bool) -> bool {
        let url = lock(&self.inner.links).ipcheck.clone();
        if url.is_empty() {
            debug!("No IP check URL configured");
            return false;
        }

        let this = self.clone();
        self.inner.slots.start(SlotKind::IpCheck, url, move |download| async move {
            this.on_ip_check(download, manual);
        })
    }

    fn on_ip_check(&self, download: Download, manual: bool) {
        let ip = match download.ensure_usable() {
            Ok(()) => extract_ipv4(&String::from_utf8_lossy(&download.bytes)).unwrap_or_default(),
            Err(e) => {
                warn!("Could not check external IP: {}", e);
                String::new()
            }
        };

        if ip.is_empty() {
            debug!("No IPv4 address found at {}", download.url);
        } else if !manual {
            debug!("External IP is {}", ip);
            lock(&self.inner.settings).external_ip.clone_from(&ip);
        }

        self.emit_setting("connection.external_ip", ip);
    }

    /// Refresh the IPv4 and IPv6 geolocation databases that are missing or stale.
    pub fn check_geo_updates(&self) {
        for ipv6 in [false, true] {
            let (path, max_age) = {
                let settings = lock(&self.inner.settings);
                (settings.geo_path(ipv6), settings.geo_max_age)
            };
            if is_fresh_file(&path, max_age) {
                debug!("Geolocation database {} is up to date", path.display());
                continue;
            }
            self.update_geo(ipv6);
        }
    }

    /// Download one geolocation database unconditionally.
    pub fn update_geo(&self, ipv6: bool) -> bool {
        let url = {
            let links = lock(&self.inner.links);
            if ipv6 { links.geoip6.clone() } else { links.geoip4.clone() }
        };
        if url.is_empty() {
            return false;
        }

        let slot = if ipv6 { SlotKind::GeoV6 } else { SlotKind::GeoV4 };
        let this = self.clone();
        self.inner.slots.start(slot, url, move |download| async move {
            this.on_geo_database(download, ipv6).await;
        })
    }

    async fn on_geo_database(&self, download: Download, ipv6: bool) {
        if let Err(e) = download.ensure_usable() {
            warn!("Could not download geolocation database: {}", e);
            return;
        }

        let path = lock(&self.inner.settings).geo_path(ipv6);
        match write_bytes(&path, &download.bytes).await {
            Ok(()) => {
                info!("Updated geolocation database {}", path.display());
                self.emit(UpdateEvent::GeoDatabaseUpdated {
                    ipv6,
                    path,
                });
            }
            Err(e) => warn!("Failed to write {}: {}", path.display(), e),
        }
    }

    /// Ask the language server whether a newer bundle exists for the configured file.
    ///
    /// Returns `false` when no language file is configured, the language URL is empty,
    /// or a language check is already running.
    pub fn check_language(&self) -> bool {
        let file = lock(&self.inner.settings).language_file.clone();
        let base = lock(&self.inner.links).language.clone();
        if file.is_empty() || base.is_empty() {
            return false;
        }

        let Some(name) = Path::new(&file).file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            warn!("Invalid language file name '{}'", file);
            return false;
        };

        let url = format!("{base}{LANGUAGE_VERSION_SCRIPT}?file={name}");
        let this = self.clone();
        self.inner.slots.start(SlotKind::LanguageCheck, url, move |download| async move {
            this.on_language_version(download, name);
        })
    }

    fn on_language_version(&self, download: Download, name: String) {
        if let Err(e) = download.ensure_usable() {
            warn!("Could not check language version: {}", e);
            return;
        }

        let token = String::from_utf8_lossy(&download.bytes).trim().to_string();
        let Some(remote) = BuildId::parse_lenient(&token) else {
            debug!("Language server answered '{}', not a version", token);
            return;
        };

        let installed = BuildId::parse_lenient(&lock(&self.inner.settings).language_version);
        if installed.as_ref().is_some_and(|installed| remote <= *installed) {
            debug!("Language file {} is up to date", name);
            return;
        }

        let url = format!("{}{}", lock(&self.inner.links).language, name);
        let this = self.clone();
        self.inner.slots.start(SlotKind::LanguageFile, url, move |download| async move {
            this.on_language_file(download, name, remote.to_string()).await;
        });
    }

    async fn on_language_file(&self, download: Download, name: String, version: String) {
        if let Err(e) = download.ensure_usable() {
            warn!("Could not download language file: {}", e);
            return;
        }

        let path = lock(&self.inner.settings).language_dir.join(&name);
        if let Err(e) = write_bytes(&path, &download.bytes).await {
            warn!("Failed to write {}: {}", path.display(), e);
            return;
        }

        lock(&self.inner.settings).language_version.clone_from(&version);
        info!("Language file {} updated to {}, restart to apply", name, version);
        self.emit(UpdateEvent::LanguageUpdated {
            path,
        });
        self.emit_setting("language.version", version);
    }
}
