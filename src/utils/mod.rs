//! Cross-platform utilities and helpers
//!
//! - [`fs`] - directory creation, file replacement and freshness checks
//! - [`platform`] - platform detection and path resolution

pub mod fs;
pub mod platform;

pub use fs::{ensure_dir, ensure_parent_dir};
pub use platform::{get_home_dir, is_windows, resolve_path};
