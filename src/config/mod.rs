//! Configuration management for Upkeep
//!
//! - [`GlobalConfig`] is the user-wide TOML file (`~/.upkeep/config.toml`), see
//!   [`global`] for its location rules and [`sections`] for the schema
//! - [`UpdateSettings`] is the resolved runtime view handed to the orchestrator
//!
//! ```rust,no_run
//! use upkeep_cli::config::{GlobalConfig, UpdateSettings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! let settings = UpdateSettings::from_config(&config)?;
//! println!("Manifest: {}", settings.manifest_url);
//! # Ok(())
//! # }
//! ```

pub mod global;
pub mod sections;
mod settings;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};
pub use sections::{
    ConnectionConfig, GeoConfig, HttpConfig, LanguageConfig, PathsConfig, UpdateConfig,
};
pub use settings::UpdateSettings;
