//! A staged package merged over an existing installation.

use std::fs;
use tempfile::TempDir;
use upkeep_cli::installer::{apply_update, clean_temp_files, extract_package};
use upkeep_cli::test_utils::build_zip;

#[test]
fn test_staged_package_replaces_installation_files() {
    let temp = TempDir::new().unwrap();
    let install = temp.path().join("install");
    fs::create_dir_all(install.join("lang")).unwrap();
    fs::write(install.join("app"), b"old build").unwrap();
    fs::write(install.join("lang/en.xml"), b"old strings").unwrap();
    fs::write(install.join("settings.xml"), b"user settings").unwrap();

    let archive = temp.path().join("Upkeep_Update.zip");
    build_zip(
        &archive,
        &[
            ("Upkeep-4.2/app", b"new build".as_slice()),
            ("lang/en.xml", b"new strings".as_slice()),
            ("lang/de.xml", b"neue Texte".as_slice()),
        ],
    );

    let staging = temp.path().join("updates/ab12");
    let staged = extract_package(&archive, &staging, &install.join("app")).unwrap();
    assert_eq!(staged, staging.join("app"));

    apply_update(&staging, &install).unwrap();

    assert_eq!(fs::read(install.join("app")).unwrap(), b"new build");
    assert_eq!(fs::read(install.join("lang/en.xml")).unwrap(), b"new strings");
    assert_eq!(fs::read(install.join("lang/de.xml")).unwrap(), b"neue Texte");
    assert_eq!(fs::read(install.join("settings.xml")).unwrap(), b"user settings");

    clean_temp_files(&temp.path().join("updates"));
    assert!(!staging.join("app").exists());
    assert!(!staging.join("lang/en.xml").exists());
    assert!(staging.join("lang").is_dir());
}
