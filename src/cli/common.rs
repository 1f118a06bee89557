//! Common utilities for CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::config::{GlobalConfig, UpdateSettings};
use crate::download::HttpTransport;
use crate::updater::{UpdateEvent, UpdateManager};

/// Configuration and resolved settings shared by the commands that talk to the update
/// server.
#[derive(Debug)]
pub struct CommandContext {
    /// Loaded global configuration (defaults when the file is missing)
    pub config: GlobalConfig,
    /// Where `config` is persisted
    pub config_path: PathBuf,
    /// Runtime settings derived from `config`
    pub settings: UpdateSettings,
}

impl CommandContext {
    /// Load the configuration at `config_path`, or the default location.
    pub async fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => GlobalConfig::default_path()?,
        };
        let config = GlobalConfig::load_with_optional(Some(config_path.clone())).await?;
        let settings = UpdateSettings::from_config(&config)?;

        Ok(Self {
            config,
            config_path,
            settings,
        })
    }

    /// An orchestrator over HTTP using the configured user agent and timeout.
    pub fn manager(&self) -> Result<UpdateManager<HttpTransport>> {
        let transport =
            HttpTransport::from_config(&self.config.http).context("Failed to set up HTTP client")?;
        Ok(UpdateManager::builder(transport, self.settings.clone()).build())
    }

    /// Write every `SettingUpdated` value in `events` back to the config file.
    ///
    /// Saves only when at least one stored key changed.
    pub async fn persist(&mut self, events: &[UpdateEvent]) -> Result<()> {
        let mut changed = false;
        for event in events {
            if let UpdateEvent::SettingUpdated {
                key,
                value,
            } = event
            {
                changed |= self.config.apply_setting(key, value);
            }
        }

        if changed {
            self.config
                .save_to(&self.config_path)
                .await
                .with_context(|| format!("Failed to persist {}", self.config_path.display()))?;
        }
        Ok(())
    }
}

/// Everything buffered in `rx`.
pub fn drain_events(rx: &mut broadcast::Receiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                tracing::warn!("Dropped {} update events", missed);
            }
            Err(_) => break,
        }
    }
    events
}

/// Print one event, as a JSON line or for humans.
pub fn print_event(event: &UpdateEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        UpdateEvent::UpdateAvailable {
            title,
            message,
            version,
            url,
            enabled,
        } => {
            println!("{} {}", "⬆".green(), title.bold());
            println!("  Version: {}", version.cyan());
            if !message.is_empty() {
                println!("  {message}");
            }
            if *enabled {
                println!("  Package: {url}");
                println!("  Run 'upkeep download' to stage it");
            } else {
                println!("  Download page: {url}");
            }
        }
        UpdateEvent::BadVersion {
            message,
            url,
            update_url,
        } => {
            println!("{} {}", "⚠️ ".yellow(), message.yellow());
            println!("  Download page: {url}");
            if !update_url.is_empty() {
                println!("  Package: {update_url}");
            }
        }
        UpdateEvent::UpdateComplete {
            executable,
            install_command,
        } => {
            println!("✅ Update staged: {}", executable.display());
            println!("  After exiting, run: upkeep {install_command}");
        }
        UpdateEvent::UpdateFailed {
            reason,
        } => println!("{} {}", "❌ Update failed:".red(), reason),
        UpdateEvent::SettingUpdated {
            key,
            value,
        } => tracing::debug!("Setting {} = {}", key, value),
        UpdateEvent::GeoDatabaseUpdated {
            path,
            ..
        } => println!("Updated geolocation database {}", path.display()),
        UpdateEvent::LanguageUpdated {
            path,
        } => println!("Updated language file {} (takes effect after restart)", path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_saves_known_settings() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        let mut config = GlobalConfig::default();
        config.paths.data_dir = temp.path().display().to_string();
        config.update.executable = Some(temp.path().join("app").display().to_string());
        config.save_to(&config_path).await.unwrap();

        let mut context = CommandContext::load(Some(config_path.clone())).await.unwrap();
        context
            .persist(&[
                UpdateEvent::SettingUpdated {
                    key: "connection.external_ip".into(),
                    value: "203.0.113.7".into(),
                },
                UpdateEvent::UpdateFailed {
                    reason: "ignored".into(),
                },
            ])
            .await
            .unwrap();

        let saved = GlobalConfig::load_from(&config_path).await.unwrap();
        assert_eq!(saved.connection.external_ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_persist_without_settings_does_not_write() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        let mut context = CommandContext {
            config: GlobalConfig::default(),
            config_path: config_path.clone(),
            settings: UpdateSettings::with_data_dir(temp.path(), temp.path().join("app")),
        };

        context.persist(&[]).await.unwrap();
        assert!(!config_path.exists());
    }

    #[test]
    fn test_print_event_json() {
        let event = UpdateEvent::UpdateFailed {
            reason: "File integrity check failed".into(),
        };
        assert!(print_event(&event, true).is_ok());
        assert!(print_event(&event, false).is_ok());
    }
}
