//! File system helpers shared by the installer, the orchestrator and the config layer.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or creation fails.
///
/// # Examples
///
/// ```rust,no_run
/// use upkeep_cli::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("updates/ab12cd/lang"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<()> {
    let safe_path = crate::utils::platform::windows_long_path(path);

    if !safe_path.exists() {
        fs::create_dir_all(&safe_path).with_context(|| {
            let platform_help = if crate::utils::platform::is_windows() {
                "On Windows: Check that the path length is < 260 chars or that long path support is enabled"
            } else {
                "Check directory permissions and path validity"
            };

            format!("Failed to create directory: {}\n\n{}", path.display(), platform_help)
        })?;
    } else if !safe_path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Remove a file, treating a missing file as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// `true` when `path` is a non-empty file modified less than `max_age` ago.
///
/// Any metadata error counts as "not fresh".
pub fn is_fresh_file(path: &Path, max_age: Duration) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() || metadata.len() == 0 {
        return false;
    }
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age < max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_rejects_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();

        assert!(ensure_dir(&temp.path().join("a/b/c")).is_ok());
        assert!(temp.path().join("a/b/c").is_dir());
        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone");
        remove_file_if_exists(&path).unwrap();
        fs::write(&path, "x").unwrap();
        remove_file_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_is_fresh_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");
        let day = Duration::from_secs(86400);

        assert!(!is_fresh_file(&path, day), "missing file");
        fs::write(&path, "").unwrap();
        assert!(!is_fresh_file(&path, day), "empty file");
        fs::write(&path, "data").unwrap();
        assert!(is_fresh_file(&path, day));
        assert!(!is_fresh_file(&path, Duration::ZERO));
        assert!(!is_fresh_file(temp.path(), day), "directory");
    }
}
