//! Runtime settings read and mutated by the update orchestrator.
//!
//! [`UpdateSettings`] is resolved once from a [`GlobalConfig`]: paths are expanded and
//! derived, intervals become [`Duration`]s. The orchestrator owns its copy; changes it
//! makes are announced as `SettingUpdated` events for the embedder to persist.

use super::GlobalConfig;
use crate::constants::{GEOIP4_FILE, GEOIP6_FILE, PACKAGE_FILE};
use crate::verify::DigestAlgorithm;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSettings {
    pub manifest_url: String,
    pub check_interval: Duration,
    pub auto_download: bool,
    pub digest_algorithm: DigestAlgorithm,
    pub last_update_notice: Option<i64>,
    /// The executable a package replaces.
    pub executable: PathBuf,
    pub ip_update: bool,
    pub auto_detect_connection: bool,
    pub external_ip: String,
    pub get_user_country: bool,
    pub geo_max_age: Duration,
    pub language_file: String,
    pub language_version: String,
    /// Downloaded archives and staging directories.
    pub temp_dir: PathBuf,
    /// Geolocation databases.
    pub geo_dir: PathBuf,
    /// Language bundles.
    pub language_dir: PathBuf,
}

impl UpdateSettings {
    /// Resolve settings from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the data directory cannot be expanded or, without an explicit
    /// `update.executable`, the running executable cannot be determined.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let data_dir = crate::utils::platform::resolve_path(&config.paths.data_dir)
            .context("Invalid paths.data_dir")?;

        let executable = match &config.update.executable {
            Some(exe) => crate::utils::platform::resolve_path(exe)
                .context("Invalid update.executable")?,
            None => std::env::current_exe().context("Failed to locate the running executable")?,
        };

        let mut settings = Self::with_data_dir(&data_dir, executable);
        settings.manifest_url.clone_from(&config.update.manifest_url);
        settings.check_interval = Duration::from_secs(config.update.check_interval);
        settings.auto_download = config.update.auto_download;
        settings.digest_algorithm = config.update.digest_algorithm;
        settings.last_update_notice = config.update.last_update_notice;
        settings.ip_update = config.connection.ip_update;
        settings.auto_detect_connection = config.connection.auto_detect_connection;
        settings.external_ip.clone_from(&config.connection.external_ip);
        settings.get_user_country = config.geo.get_user_country;
        settings.geo_max_age = Duration::from_secs(config.geo.max_age_days * 86400);
        settings.language_file.clone_from(&config.language.file);
        settings.language_version.clone_from(&config.language.version);
        Ok(settings)
    }

    /// Defaults rooted at `data_dir`, with every optional sub-cycle disabled.
    pub fn with_data_dir(data_dir: &Path, executable: PathBuf) -> Self {
        let defaults = GlobalConfig::default();
        Self {
            manifest_url: defaults.update.manifest_url,
            check_interval: Duration::from_secs(defaults.update.check_interval),
            auto_download: false,
            digest_algorithm: DigestAlgorithm::default(),
            last_update_notice: None,
            executable,
            ip_update: false,
            auto_detect_connection: false,
            external_ip: String::new(),
            get_user_country: false,
            geo_max_age: Duration::from_secs(defaults.geo.max_age_days * 86400),
            language_file: String::new(),
            language_version: String::new(),
            temp_dir: data_dir.join("updates"),
            geo_dir: data_dir.join("geo"),
            language_dir: data_dir.join("lang"),
        }
    }

    /// Where the downloaded update archive is written.
    pub fn package_path(&self) -> PathBuf {
        self.temp_dir.join(PACKAGE_FILE)
    }

    /// Compressed geolocation database for the given address family.
    pub fn geo_path(&self, ipv6: bool) -> PathBuf {
        self.geo_dir.join(if ipv6 { GEOIP6_FILE } else { GEOIP4_FILE })
    }

    /// Directory the new files are merged into: the executable's parent.
    pub fn install_dir(&self) -> PathBuf {
        self.executable.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    }

    /// The signature URL belonging to the manifest URL.
    pub fn signature_url(&self) -> String {
        format!("{}{}", self.manifest_url, crate::constants::SIGNATURE_SUFFIX)
    }
}
