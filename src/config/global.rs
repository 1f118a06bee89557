//! Global configuration management for Upkeep.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.upkeep/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\upkeep\config.toml`
//! - **Override**: the `UPKEEP_CONFIG_PATH` environment variable
//!
//! A missing file is not an error: every section falls back to its defaults.

use super::sections::{
    ConnectionConfig, GeoConfig, HttpConfig, LanguageConfig, PathsConfig, UpdateConfig,
};
use crate::core::UpkeepError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "UPKEEP_CONFIG_PATH";

/// Global configuration structure for Upkeep.
///
/// # Examples
///
/// ```rust,no_run
/// use upkeep_cli::config::GlobalConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut config = GlobalConfig::load().await?;
/// config.update.auto_download = true;
/// config.save().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub update: UpdateConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub geo: GeoConfig,

    #[serde(default)]
    pub language: LanguageConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

impl GlobalConfig {
    /// Load configuration from the default location, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, else from the default location.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .map_err(UpkeepError::from)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save to the default location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path).await
    }

    /// Save to `path`, creating parent directories as needed.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(UpkeepError::from)
            .context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        Ok(())
    }

    /// Platform default path, honouring `UPKEEP_CONFIG_PATH`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
            if !custom.is_empty() {
                return Ok(PathBuf::from(custom));
            }
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("upkeep")
        } else {
            crate::utils::get_home_dir()?.join(".upkeep")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Persist a value announced through a `SettingUpdated` event.
    ///
    /// Returns `false` for keys this file does not store.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> bool {
        match key {
            "update.last_update_notice" => match value.parse() {
                Ok(secs) => {
                    self.update.last_update_notice = Some(secs);
                    true
                }
                Err(_) => false,
            },
            "connection.external_ip" => {
                self.connection.external_ip = value.to_string();
                true
            }
            "language.version" => {
                self.language.version = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// A commented starting point written by `upkeep config init`.
    pub fn init_example() -> Self {
        let mut config = Self::default();
        config.connection.ip_update = true;
        config.geo.get_user_country = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::DigestAlgorithm;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("none.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
        assert_eq!(config.geo.max_age_days, 25);
        assert!(config.update.check_on_startup);
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.toml");

        let mut config = GlobalConfig::default();
        config.update.manifest_url = "https://mirror.example/version.xml".into();
        config.update.digest_algorithm = DigestAlgorithm::Sha512;
        config.language.file = "German.xml".into();
        config.save_to(&path).await.unwrap();

        let loaded = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[update]\nauto_download = true\n\n[geo]\nget_user_country = true\n")
            .unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        assert!(config.update.auto_download);
        assert!(config.geo.get_user_country);
        assert_eq!(config.update.check_interval, 86400);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[update\nmanifest_url = ").unwrap();

        let err = GlobalConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse global config"));
    }

    #[test]
    #[serial]
    fn test_default_path_env_override() {
        let temp = TempDir::new().unwrap();
        let custom = temp.path().join("custom.toml");
        unsafe { std::env::set_var(CONFIG_PATH_ENV, &custom) };
        let resolved = GlobalConfig::default_path().unwrap();
        unsafe { std::env::remove_var(CONFIG_PATH_ENV) };

        assert_eq!(resolved, custom);
        assert!(GlobalConfig::default_path().unwrap().ends_with("config.toml"));
    }

    #[test]
    fn test_apply_setting() {
        let mut config = GlobalConfig::default();
        assert!(config.apply_setting("connection.external_ip", "203.0.113.7"));
        assert!(config.apply_setting("update.last_update_notice", "1700000000"));
        assert!(config.apply_setting("language.version", "2210"));
        assert!(!config.apply_setting("update.last_update_notice", "yesterday"));
        assert!(!config.apply_setting("unknown.key", "x"));

        assert_eq!(config.connection.external_ip, "203.0.113.7");
        assert_eq!(config.update.last_update_notice, Some(1_700_000_000));
        assert_eq!(config.language.version, "2210");
    }
}
