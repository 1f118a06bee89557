//! The `upkeep` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use upkeep_cli::test_utils::test_public_key;

fn upkeep() -> Command {
    let mut cmd = Command::cargo_bin("upkeep").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_sign_then_verify() {
    let temp = TempDir::new().unwrap();
    let manifest = temp.path().join("version.xml");
    let key = temp.path().join("publisher.key");
    fs::write(&manifest, "<DCUpdate><BuildID>4100</BuildID></DCUpdate>").unwrap();
    fs::write(&key, format!("{}\n", hex::encode([7u8; 32]))).unwrap();

    upkeep()
        .arg("sign")
        .arg(&manifest)
        .arg("--key")
        .arg(&key)
        .arg("--emit-public-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed"));

    assert_eq!(fs::read(temp.path().join("version.xml.sign")).unwrap().len(), 64);
    let header = fs::read_to_string(temp.path().join("pubkey.rs")).unwrap();
    assert!(header.contains("pub const TRUSTED_PUBLIC_KEY: [u8; 32]"));

    let public_key = hex::encode(test_public_key());
    upkeep()
        .arg("verify")
        .arg(&manifest)
        .args(["--public-key", &public_key])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid signature"));

    // Signed with a key other than the compiled-in one
    upkeep().arg("verify").arg(&manifest).assert().failure();

    fs::write(&manifest, "<DCUpdate><BuildID>9999</BuildID></DCUpdate>").unwrap();
    upkeep()
        .arg("verify")
        .arg(&manifest)
        .args(["--public-key", &public_key])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Signature verification failed"));
}

#[test]
fn test_sign_with_bad_key_fails() {
    let temp = TempDir::new().unwrap();
    let manifest = temp.path().join("version.xml");
    let key = temp.path().join("publisher.key");
    fs::write(&manifest, "<DCUpdate/>").unwrap();
    fs::write(&key, "not a key").unwrap();

    upkeep().arg("sign").arg(&manifest).arg("--key").arg(&key).assert().failure();
    assert!(!temp.path().join("version.xml.sign").exists());
}

#[test]
fn test_apply_update_and_clean_temp() {
    let temp = TempDir::new().unwrap();
    let staging = temp.path().join("updates/ab12");
    let install = temp.path().join("install");
    fs::create_dir_all(staging.join("plugins")).unwrap();
    fs::create_dir_all(&install).unwrap();
    fs::write(staging.join("app"), b"new").unwrap();
    fs::write(staging.join("plugins/extra.dat"), b"plugin").unwrap();
    fs::write(install.join("app"), b"old").unwrap();

    upkeep()
        .arg("apply-update")
        .arg(&staging)
        .arg(&install)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied update"));

    assert_eq!(fs::read(install.join("app")).unwrap(), b"new");
    assert_eq!(fs::read(install.join("plugins/extra.dat")).unwrap(), b"plugin");

    upkeep().arg("clean-temp").arg(temp.path().join("updates")).assert().success();
    assert!(!staging.join("app").exists());
    assert!(staging.join("plugins").is_dir());
}

#[test]
fn test_apply_update_missing_source_fails() {
    let temp = TempDir::new().unwrap();
    upkeep()
        .arg("apply-update")
        .arg(temp.path().join("missing"))
        .arg(temp.path().join("install"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_config_path_honours_environment() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("custom.toml");

    upkeep()
        .args(["config", "path"])
        .env("UPKEEP_CONFIG_PATH", &config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(config_path.display().to_string()));
}

#[test]
fn test_config_init_and_show() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");

    upkeep().arg("--config").arg(&config_path).args(["config", "init"]).assert().success();
    assert!(config_path.exists());

    upkeep()
        .arg("--config")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[update]"))
        .stdout(predicate::str::contains("manifest_url"));
}
