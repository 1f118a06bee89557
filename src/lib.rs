//! Upkeep - signed self-update pipeline
//!
//! Upkeep keeps a desktop or server application current: it downloads a version
//! manifest and its detached Ed25519 signature, trusts the manifest only when the
//! signature verifies against a compiled-in key, compares the announced build with the
//! running one, and downloads, hash-checks and stages update packages for a detached
//! installer that runs after the application has exited.
//!
//! # Architecture Overview
//!
//! ```text
//! check_version ─> Signature slot ─> Manifest slot ─verify─> parse ─> decide
//!                                                                      │
//!        BadVersion / UpdateAvailable events <────────────────────────┤
//!        IP check, geolocation databases, language bundle <───────────┤
//!                                                                      │
//! download_update ─> Package slot ─hash─> extract to staging ─> UpdateComplete
//!                                                                      │
//!                 upkeep apply-update <staging> <install dir> <────────┘
//! ```
//!
//! Every fetch runs through a named download slot; a slot holds at most one live
//! fetch and hands the result to a single-use continuation, which is where the
//! pipeline chains to its next stage.
//!
//! # Core Modules
//!
//! - [`updater`] - The orchestrator state machine and its events
//! - [`download`] - Download slots and the network transport
//! - [`verify`] - Signature verification, package integrity and digests
//! - [`manifest`] - Version manifest parsing and server links
//! - [`installer`] - Package extraction and the merge-over-install step
//!
//! # Supporting Modules
//!
//! - [`cli`] - The `upkeep` command-line interface
//! - [`config`] - Global configuration (`~/.upkeep/config.toml`) and runtime settings
//! - [`core`] - Error types and user-facing error reporting
//! - [`version`] - Dotted numeric build identifiers
//! - [`utils`] - Filesystem and platform helpers
//! - [`constants`] - Default URLs, file names and limits
//!
//! # Example
//!
//! ```rust,no_run
//! use upkeep_cli::config::{GlobalConfig, UpdateSettings};
//! use upkeep_cli::download::HttpTransport;
//! use upkeep_cli::updater::{UpdateEvent, UpdateManager};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! let settings = UpdateSettings::from_config(&config)?;
//! let manager = UpdateManager::builder(HttpTransport::from_config(&config.http)?, settings).build();
//!
//! let mut events = manager.subscribe();
//! manager.check_version(false);
//! while let Ok(event) = events.recv().await {
//!     if let UpdateEvent::UpdateAvailable { enabled: true, .. } = event {
//!         manager.download_update(std::env::current_exe()?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod download;
pub mod installer;
pub mod manifest;
pub mod updater;
pub mod verify;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
