//! Check, download and staging cycles through the public API.

use std::path::Path;
use tempfile::TempDir;
use tokio::sync::broadcast;
use upkeep_cli::config::UpdateSettings;
use upkeep_cli::test_utils::{
    ManifestFixture, MockTransport, publish_manifest, sign_with_test_key, test_verifier, zip_bytes,
};
use upkeep_cli::updater::{Phase, UpdateEvent, UpdateManager};
use upkeep_cli::verify::DigestAlgorithm;
use upkeep_cli::version::BuildId;

const MANIFEST_URL: &str = "https://updates.example.test/version.xml";
const PACKAGE_URL: &str = "https://updates.example.test/Upkeep-4.2.zip";

fn settings(dir: &Path) -> UpdateSettings {
    let mut settings = UpdateSettings::with_data_dir(dir, dir.join("install").join("app"));
    settings.manifest_url = MANIFEST_URL.to_string();
    settings
}

fn build_manager(transport: &MockTransport, settings: UpdateSettings) -> UpdateManager<MockTransport> {
    UpdateManager::builder(transport.clone(), settings)
        .running_build(BuildId::from_components(vec![4, 1]))
        .verifier(test_verifier())
        .build()
}

fn drain(rx: &mut broadcast::Receiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_check_download_and_stage() {
    upkeep_cli::test_utils::init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();

    let package = zip_bytes(&[
        ("Upkeep/app", b"build 4.2".as_slice()),
        ("Upkeep/share/readme.txt", b"release notes".as_slice()),
    ]);
    let hash = DigestAlgorithm::Sha256.hex_digest(&package);
    transport.respond(PACKAGE_URL, package);

    let xml = ManifestFixture::new("4.2")
        .version("4.2")
        .title("Upkeep 4.2")
        .package(PACKAGE_URL, &format!("sha256:{}", hash.to_uppercase()))
        .to_xml();
    publish_manifest(&transport, MANIFEST_URL, &xml);

    let settings = settings(temp.path());
    let executable = settings.executable.clone();
    let install_dir = settings.install_dir();
    let manager = build_manager(&transport, settings);
    let mut rx = manager.subscribe();

    assert!(manager.check_version(false));
    manager.wait_idle().await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        UpdateEvent::UpdateAvailable { version, enabled: true, url, .. }
            if version == "4.2" && url == PACKAGE_URL
    )));

    assert!(manager.download_update(&executable));
    manager.wait_idle().await;

    let events = drain(&mut rx);
    let [UpdateEvent::UpdateComplete { executable: staged, install_command }] = events.as_slice()
    else {
        panic!("expected a single UpdateComplete, got {events:?}");
    };

    let staging = temp.path().join("updates").join(&hash);
    assert_eq!(staged, &staging.join("app"));
    assert_eq!(std::fs::read(staged).unwrap(), b"build 4.2");
    assert_eq!(
        std::fs::read(staging.join("Upkeep/share/readme.txt")).unwrap(),
        b"release notes"
    );
    assert!(install_command.starts_with("apply-update "));
    assert!(install_command.contains(&install_dir.display().to_string()));

    assert!(!temp.path().join("updates/Upkeep_Update.zip").exists());
    assert!(!manager.is_updating());
    assert_eq!(manager.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_forged_manifest_never_reaches_package() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();

    let genuine = ManifestFixture::new("9.0").package(PACKAGE_URL, "ab12").to_xml();
    let forged = ManifestFixture::new("9.9").package("https://evil.test/x.zip", "cd34").to_xml();
    transport.respond(format!("{MANIFEST_URL}.sign"), sign_with_test_key(genuine.as_bytes()));
    transport.respond(MANIFEST_URL, forged.into_bytes());

    let mut settings = settings(temp.path());
    settings.auto_download = true;
    let manager = build_manager(&transport, settings);
    let mut rx = manager.subscribe();

    assert!(manager.check_version(true));
    manager.wait_idle().await;

    assert!(drain(&mut rx).is_empty());
    assert!(manager.pending_update().is_none());
    assert!(!manager.is_updating());
    assert!(!manager.download_update(temp.path().join("app")));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_tampered_package_is_discarded() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();

    let announced = zip_bytes(&[("app", b"genuine".as_slice())]);
    let hash = DigestAlgorithm::Sha256.hex_digest(&announced);
    transport.respond(PACKAGE_URL, zip_bytes(&[("app", b"tampered".as_slice())]));
    let xml = ManifestFixture::new("4.2").package(PACKAGE_URL, &hash).to_xml();
    publish_manifest(&transport, MANIFEST_URL, &xml);

    let mut settings = settings(temp.path());
    settings.auto_download = true;
    let manager = build_manager(&transport, settings);
    let mut rx = manager.subscribe();

    assert!(manager.check_version(false));
    manager.wait_idle().await;

    let events = drain(&mut rx);
    assert!(events.contains(&UpdateEvent::UpdateFailed {
        reason: "File integrity check failed".to_string(),
    }));
    assert!(!events.iter().any(|e| matches!(e, UpdateEvent::UpdateComplete { .. })));
    assert!(!temp.path().join("updates/Upkeep_Update.zip").exists());
    assert!(!temp.path().join("updates").join(&hash).exists());
    assert!(!manager.is_updating());
}

#[tokio::test]
async fn test_package_without_executable_fails() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();

    let package = zip_bytes(&[("docs/readme.txt", b"no binary here".as_slice())]);
    let hash = DigestAlgorithm::Sha256.hex_digest(&package);
    transport.respond(PACKAGE_URL, package);
    let xml = ManifestFixture::new("4.2").package(PACKAGE_URL, &hash).to_xml();
    publish_manifest(&transport, MANIFEST_URL, &xml);

    let settings = settings(temp.path());
    let executable = settings.executable.clone();
    let manager = build_manager(&transport, settings);
    manager.check_version(false);
    manager.wait_idle().await;

    let mut rx = manager.subscribe();
    assert!(manager.download_update(executable));
    manager.wait_idle().await;

    let events = drain(&mut rx);
    assert!(matches!(events.as_slice(), [UpdateEvent::UpdateFailed { .. }]));
    assert!(!temp.path().join("updates/Upkeep_Update.zip").exists());
    assert!(!manager.is_updating());
}

#[tokio::test]
async fn test_links_from_manifest_drive_auxiliary_checks() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();

    let xml = ManifestFixture::new("4.1")
        .link("IPCheck", "https://ip.example.test/")
        .link("GeoIPv4", "https://geo.example.test/v4.dat.gz")
        .link("GeoIPv6", "https://geo.example.test/v6.dat.gz")
        .to_xml();
    publish_manifest(&transport, MANIFEST_URL, &xml);
    transport.respond("https://ip.example.test/", "Current IP Address: 192.0.2.44");
    transport.respond("https://geo.example.test/v4.dat.gz", b"geo v4".to_vec());
    transport.respond("https://geo.example.test/v6.dat.gz", b"geo v6".to_vec());

    let mut settings = settings(temp.path());
    settings.ip_update = true;
    settings.get_user_country = true;
    let v4_path = settings.geo_path(false);
    let manager = build_manager(&transport, settings);
    let mut rx = manager.subscribe();

    assert!(manager.check_version(false));
    manager.wait_idle().await;

    let events = drain(&mut rx);
    assert!(events.contains(&UpdateEvent::SettingUpdated {
        key: "connection.external_ip".to_string(),
        value: "192.0.2.44".to_string(),
    }));
    assert!(events.contains(&UpdateEvent::GeoDatabaseUpdated {
        ipv6: false,
        path: v4_path.clone(),
    }));
    assert_eq!(std::fs::read(v4_path).unwrap(), b"geo v4");
    assert_eq!(manager.settings().external_ip, "192.0.2.44");
    assert_eq!(manager.links().ipcheck, "https://ip.example.test/");
}
