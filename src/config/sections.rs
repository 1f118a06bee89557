//! Sections of the global configuration file.
//!
//! Every field has a serde default so a partial or empty file is valid.
//!
//! ```toml
//! [update]
//! manifest_url = "https://updates.upkeep.dev/version.xml"
//! check_on_startup = true
//! check_interval = 86400
//! auto_download = false
//! digest_algorithm = "sha256"
//!
//! [connection]
//! ip_update = true
//! auto_detect_connection = false
//!
//! [geo]
//! get_user_country = true
//! max_age_days = 25
//!
//! [language]
//! file = "German.xml"
//! version = "2210"
//!
//! [paths]
//! data_dir = "~/.upkeep"
//!
//! [http]
//! timeout_secs = 60
//! ```

use crate::constants::{
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MANIFEST_URL,
    DEFAULT_USER_AGENT, GEO_MAX_AGE,
};
use crate::verify::DigestAlgorithm;
use serde::{Deserialize, Serialize};

/// Version checking and package download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Location of the signed manifest; the signature lives at `<manifest_url>.sign`.
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,

    /// Run one check when `upkeep watch` starts.
    #[serde(default = "default_true")]
    pub check_on_startup: bool,

    /// Seconds between automatic checks. `0` disables periodic checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Download the package as soon as a verified manifest announces an enabled update.
    #[serde(default)]
    pub auto_download: bool,

    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,

    /// Unix time of the last `UpdateAvailable` notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_notice: Option<i64>,

    /// Executable to replace. Defaults to the running binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            check_on_startup: true,
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            auto_download: false,
            digest_algorithm: DigestAlgorithm::default(),
            last_update_notice: None,
            executable: None,
        }
    }
}

/// Public address discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Refresh the external IP after each check.
    #[serde(default)]
    pub ip_update: bool,

    /// Address discovery is handled elsewhere; suppresses the IP check.
    #[serde(default)]
    pub auto_detect_connection: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_ip: String,
}

/// Geolocation database refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default)]
    pub get_user_country: bool,

    /// Databases younger than this are kept.
    #[serde(default = "default_geo_max_age_days")]
    pub max_age_days: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            get_user_country: false,
            max_age_days: default_geo_max_age_days(),
        }
    }
}

/// Localized text bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Bundle file name, e.g. `German.xml`. Empty disables the language check.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    /// Installed bundle version as a build token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the update temp directory, geo databases and language bundles.
    /// `~` and environment variables are expanded.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Default transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

const fn default_geo_max_age_days() -> u64 {
    GEO_MAX_AGE.as_secs() / 86400
}

fn default_data_dir() -> String {
    if cfg!(target_os = "windows") {
        "$LOCALAPPDATA/upkeep".to_string()
    } else {
        "~/.upkeep".to_string()
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
