//! Platform-specific helpers.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Gets the home directory path for the current user.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expands a leading `~` and environment variables in a configured path.
///
/// ```rust,no_run
/// use upkeep_cli::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let data = resolve_path("~/.upkeep/data")?;
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Adds the `\\?\` prefix to long absolute paths on Windows.
#[cfg(windows)]
pub fn windows_long_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.len() > 260 && !path_str.starts_with(r"\\?\") {
        let absolute_path = if path.is_relative() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(path)
        } else {
            path.to_path_buf()
        };

        let absolute_str = absolute_path.to_string_lossy();
        if absolute_str.len() > 260 {
            if let Some(stripped) = absolute_str.strip_prefix(r"\\") {
                PathBuf::from(format!(r"\\?\UNC\{}", stripped))
            } else {
                PathBuf::from(format!(r"\\?\{}", absolute_str))
            }
        } else {
            absolute_path
        }
    } else {
        path.to_path_buf()
    }
}

/// No-op on non-Windows platforms.
#[cfg(not(windows))]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_expands_home() {
        let home = get_home_dir().unwrap();
        assert_eq!(resolve_path("~/.upkeep").unwrap(), home.join(".upkeep"));
        assert_eq!(resolve_path("/opt/app").unwrap(), PathBuf::from("/opt/app"));
    }

    #[test]
    fn test_resolve_path_unknown_variable() {
        assert!(resolve_path("$UPKEEP_SURELY_UNSET_VARIABLE/x").is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_long_path_noop() {
        let p = Path::new("relative/path");
        assert_eq!(windows_long_path(p), p);
    }
}
