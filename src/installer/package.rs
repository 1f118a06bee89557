//! Unpacking verified update archives.

use crate::core::UpkeepError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Extract `archive` into `staging` and return the path of the staged executable.
///
/// The first entry whose file name ends with the extension of `executable` (or, for an
/// extensionless executable, whose file name equals it) is written as
/// `<staging>/<executable file name>`. Every other entry keeps its relative path. Entries
/// that would escape `staging` are rejected.
///
/// # Errors
///
/// Fails with [`UpkeepError::Archive`] for undecodable archives or unsafe entry names and
/// with [`UpkeepError::ExecutableNotFound`] when no entry matches the executable.
pub fn extract_package(archive: &Path, staging: &Path, executable: &Path) -> Result<PathBuf> {
    let exe_name = executable.file_name().ok_or_else(|| UpkeepError::FileSystemError {
        operation: "resolve executable name".to_string(),
        path: executable.display().to_string(),
    })?;
    let extension = executable.extension().map(|e| format!(".{}", e.to_string_lossy()));

    let file = File::open(archive)
        .with_context(|| format!("Failed to open update package {}", archive.display()))?;
    let mut zip = ZipArchive::new(file).map_err(UpkeepError::from)?;

    crate::utils::fs::ensure_dir(staging)?;
    let staged_exe = staging.join(exe_name);
    let mut found = false;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(UpkeepError::from)?;

        let relative = entry.enclosed_name().ok_or_else(|| UpkeepError::Archive {
            reason: format!("unsafe entry name '{}'", entry.name()),
        })?;

        if entry.is_dir() {
            crate::utils::fs::ensure_dir(&staging.join(&relative))?;
            continue;
        }

        let is_executable = !found && matches_executable(&relative, exe_name, extension.as_deref());
        let target = if is_executable {
            found = true;
            staged_exe.clone()
        } else {
            staging.join(&relative)
        };

        crate::utils::fs::ensure_parent_dir(&target)?;
        let mut out = File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {}", relative.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))
                    .with_context(|| format!("Failed to set permissions on {}", target.display()))?;
            }
        }

        debug!("Extracted {} -> {}", relative.display(), target.display());
    }

    if !found {
        return Err(UpkeepError::ExecutableNotFound {
            extension: extension.unwrap_or_else(|| exe_name.to_string_lossy().into_owned()),
        }
        .into());
    }

    Ok(staged_exe)
}

fn matches_executable(
    relative: &Path,
    exe_name: &std::ffi::OsStr,
    extension: Option<&str>,
) -> bool {
    let Some(name) = relative.file_name() else {
        return false;
    };
    match extension {
        Some(ext) => name.to_string_lossy().to_ascii_lowercase().ends_with(&ext.to_ascii_lowercase()),
        None => name == exe_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_zip;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_executable_renamed_and_others_kept() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.zip");
        build_zip(
            &archive,
            &[
                ("bin/Upkeep-4.20.exe", b"new exe".as_slice()),
                ("readme.txt", b"notes".as_slice()),
                ("lang/en.xml", b"<Language/>".as_slice()),
            ],
        );

        let staging = temp.path().join("staging");
        let exe = extract_package(&archive, &staging, Path::new("C:/Apps/Upkeep/app.exe")).unwrap();

        assert_eq!(exe, staging.join("app.exe"));
        assert_eq!(fs::read(&exe).unwrap(), b"new exe");
        assert_eq!(fs::read(staging.join("readme.txt")).unwrap(), b"notes");
        assert!(staging.join("lang/en.xml").is_file());
        assert!(!staging.join("bin/Upkeep-4.20.exe").exists());
    }

    #[test]
    fn test_extensionless_executable_matches_by_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.zip");
        build_zip(&archive, &[("dist/upkeep", b"elf".as_slice()), ("LICENSE", b"mit".as_slice())]);

        let staging = temp.path().join("staging");
        let exe = extract_package(&archive, &staging, Path::new("/usr/local/bin/upkeep")).unwrap();
        assert_eq!(exe, staging.join("upkeep"));
        assert_eq!(fs::read(&exe).unwrap(), b"elf");
    }

    #[test]
    fn test_missing_executable_is_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.zip");
        build_zip(&archive, &[("readme.txt", b"notes".as_slice())]);

        let err = extract_package(&archive, &temp.path().join("s"), Path::new("app.exe")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpkeepError>(),
            Some(UpkeepError::ExecutableNotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = extract_package(&archive, &temp.path().join("s"), Path::new("app.exe")).unwrap_err();
        assert!(matches!(err.downcast_ref::<UpkeepError>(), Some(UpkeepError::Archive { .. })));
    }

    #[test]
    fn test_escaping_entry_is_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("pkg.zip");
        build_zip(&archive, &[("../evil.exe", b"x".as_slice())]);

        let staging = temp.path().join("staging");
        assert!(extract_package(&archive, &staging, Path::new("app.exe")).is_err());
        assert!(!temp.path().join("evil.exe").exists());
    }
}
