//! Staging and applying update packages.
//!
//! The installer runs in two places:
//!
//! - inside the orchestrator, where [`extract_package`] unpacks a verified archive into a
//!   staging directory named by its content hash
//! - in a detached `upkeep apply-update <staging> <install dir>` process started after
//!   the host exits, where [`apply_update`] merges the staged tree over the installation
//!
//! # Failure Semantics
//!
//! [`apply_update`] aborts on the first failing file operation and does **not** roll
//! back: files copied before the failure stay in place. [`clean_temp_files`] is best
//! effort and never fails.

mod package;

pub use package::extract_package;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Recursively merge `source` over `dest`.
///
/// Directories are created on demand and merged into; files replace any existing
/// destination file (deleted first, then copied). Symbolic links are skipped. The first
/// failure returns immediately, so later siblings are never visited.
///
/// # Examples
///
/// ```rust,no_run
/// use upkeep_cli::installer::apply_update;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// apply_update(Path::new("/tmp/upkeep/ab12cd"), Path::new("/opt/app"))?;
/// # Ok(())
/// # }
/// ```
pub fn apply_update(source: &Path, dest: &Path) -> Result<()> {
    crate::utils::fs::ensure_dir(dest)?;

    let entries = fs::read_dir(source)
        .with_context(|| format!("Failed to read directory: {}", source.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", source.display()))?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dest.join(entry.file_name());

        if file_type.is_dir() {
            apply_update(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            replace_file(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

fn replace_file(src: &Path, dst: &Path) -> Result<()> {
    match fs::remove_file(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to remove {}", dst.display()));
        }
    }

    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy file from {} to {}", src.display(), dst.display())
    })?;
    debug!("Replaced {}", dst.display());
    Ok(())
}

/// Delete every regular file below `dir`, keeping the directory skeleton.
///
/// Errors are logged at debug level and otherwise ignored.
pub fn clean_temp_files(dir: &Path) {
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable temp entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() {
            if let Err(e) = fs::remove_file(entry.path()) {
                debug!("Could not delete {}: {}", entry.path().display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_apply_update_merges_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging");
        let dst = temp.path().join("install");

        write(&src.join("a.txt"), "new a");
        write(&src.join("sub/b.txt"), "b");
        write(&dst.join("a.txt"), "old a");
        write(&dst.join("c.txt"), "untouched");

        apply_update(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "new a");
        assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "b");
        assert_eq!(fs::read_to_string(dst.join("c.txt")).unwrap(), "untouched");
    }

    #[test]
    fn test_apply_update_creates_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging");
        write(&src.join("deep/er/file.bin"), "x");

        let dst = temp.path().join("fresh");
        apply_update(&src, &dst).unwrap();
        assert!(dst.join("deep/er/file.bin").is_file());
    }

    #[test]
    fn test_apply_update_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let err = apply_update(&temp.path().join("nope"), &temp.path().join("dst")).unwrap_err();
        assert!(err.to_string().contains("Failed to read directory"));
    }

    #[test]
    fn test_apply_update_aborts_without_rollback() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging");
        let dst = temp.path().join("install");

        write(&src.join("one.txt"), "1");
        write(&src.join("blocked/two.txt"), "2");
        // A file where the source has a directory makes the merge fail
        write(&dst.join("blocked"), "not a directory");

        assert!(apply_update(&src, &dst).is_err());
        assert!(!dst.join("blocked").is_dir());
        // Nothing is restored or removed after the failure
        assert_eq!(fs::read_to_string(dst.join("blocked")).unwrap(), "not a directory");
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_update_skips_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging");
        let dst = temp.path().join("install");
        write(&src.join("real.txt"), "r");
        std::os::unix::fs::symlink(src.join("real.txt"), src.join("link.txt")).unwrap();

        apply_update(&src, &dst).unwrap();
        assert!(dst.join("real.txt").exists());
        assert!(!dst.join("link.txt").exists());
    }

    #[test]
    fn test_clean_temp_files_keeps_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("updates");
        write(&root.join("Upkeep_Update.zip"), "zip");
        write(&root.join("ab12/app.exe"), "exe");
        write(&root.join("ab12/data/x.dat"), "x");

        clean_temp_files(&root);

        assert!(!root.join("Upkeep_Update.zip").exists());
        assert!(!root.join("ab12/app.exe").exists());
        assert!(!root.join("ab12/data/x.dat").exists());
        assert!(root.join("ab12/data").is_dir());
    }

    #[test]
    fn test_clean_temp_files_missing_dir_is_silent() {
        let temp = TempDir::new().unwrap();
        clean_temp_files(&temp.path().join("does-not-exist"));
    }
}
