//! Fixtures for signed manifests and update packages.

use super::MockTransport;
use crate::verify::{DigestAlgorithm, SignatureVerifier, sign_bytes};
use ed25519_dalek::SigningKey;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Deterministic Ed25519 key standing in for the publisher's key.
pub fn test_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn test_public_key() -> [u8; 32] {
    test_signing_key().verifying_key().to_bytes()
}

/// A SHA-256 verifier trusting [`test_signing_key`].
pub fn test_verifier() -> SignatureVerifier {
    SignatureVerifier::with_key(test_public_key(), DigestAlgorithm::Sha256)
}

pub fn sign_with_test_key(data: &[u8]) -> Vec<u8> {
    sign_bytes(data, &test_signing_key(), DigestAlgorithm::Sha256)
}

/// Serve `xml` at `manifest_url` and its valid signature at `<manifest_url>.sign`.
pub fn publish_manifest(transport: &MockTransport, manifest_url: &str, xml: &str) {
    transport.respond(format!("{manifest_url}.sign"), sign_with_test_key(xml.as_bytes()));
    transport.respond(manifest_url, xml.as_bytes().to_vec());
}

/// In-memory zip archive with the given `(name, contents)` entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, zip_bytes(entries)).unwrap();
}

/// Builder for version manifest documents.
///
/// ```rust,no_run
/// use upkeep_cli::test_utils::ManifestFixture;
///
/// let xml = ManifestFixture::new("4100")
///     .package("https://e/pkg.zip", "ab12")
///     .bad_version("4001", None)
///     .to_xml();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestFixture {
    build: String,
    version: Option<String>,
    title: Option<String>,
    message: Option<String>,
    page_url: Option<String>,
    package: Option<(String, String, bool)>,
    very_old: Option<(String, Option<String>)>,
    bad_versions: Vec<(String, Option<String>)>,
    bad_versions_nested: bool,
    links: Vec<(String, String)>,
}

impl ManifestFixture {
    pub fn new(build: &str) -> Self {
        Self {
            build: build.to_string(),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn page_url(mut self, url: &str) -> Self {
        self.page_url = Some(url.to_string());
        self
    }

    pub fn package(mut self, url: &str, hash: &str) -> Self {
        self.package = Some((url.to_string(), hash.to_string(), true));
        self
    }

    pub fn disabled_package(mut self, url: &str, hash: &str) -> Self {
        self.package = Some((url.to_string(), hash.to_string(), false));
        self
    }

    pub fn very_old(mut self, threshold: &str, message: Option<&str>) -> Self {
        self.very_old = Some((threshold.to_string(), message.map(str::to_string)));
        self
    }

    pub fn bad_version(mut self, build: &str, message: Option<&str>) -> Self {
        self.bad_versions.push((build.to_string(), message.map(str::to_string)));
        self
    }

    /// Render the `bad_version` entries inside one `<BadVersion>` container element.
    pub fn nested_bad_versions(mut self) -> Self {
        self.bad_versions_nested = true;
        self
    }

    /// Add a `<Links>` child, e.g. `link("IPCheck", "https://e/ip")`.
    pub fn link(mut self, element: &str, url: &str) -> Self {
        self.links.push((element.to_string(), url.to_string()));
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<DCUpdate>\n");
        let mut element = |name: &str, value: &Option<String>| {
            if let Some(value) = value {
                xml.push_str(&format!("  <{name}>{value}</{name}>\n"));
            }
        };
        element("Version", &self.version);
        element("BuildID", &Some(self.build.clone()));
        element("Title", &self.title);
        element("Message", &self.message);
        element("URL", &self.page_url);

        // Generic and x64 entries carry the same package so the fixture works on any target
        if let Some((url, hash, enabled)) = &self.package {
            let enabled = if *enabled { "1" } else { "0" };
            for tag in ["UpdateURL", "UpdateURLx64"] {
                xml.push_str(&format!(
                    "  <{tag} Hash=\"{hash}\" Enabled=\"{enabled}\">{url}</{tag}>\n"
                ));
            }
        }

        if let Some((threshold, message)) = &self.very_old {
            match message {
                Some(m) => xml.push_str(&format!(
                    "  <VeryOldVersion Message=\"{m}\">{threshold}</VeryOldVersion>\n"
                )),
                None => xml.push_str(&format!("  <VeryOldVersion>{threshold}</VeryOldVersion>\n")),
            }
        }

        let nested = self.bad_versions_nested && !self.bad_versions.is_empty();
        if nested {
            xml.push_str("  <BadVersion>\n");
        }
        for (build, message) in &self.bad_versions {
            match message {
                Some(m) => {
                    xml.push_str(&format!("  <BadVersion Version=\"{build}\" Message=\"{m}\"/>\n"))
                }
                None => xml.push_str(&format!("  <BadVersion Version=\"{build}\"/>\n")),
            }
        }
        if nested {
            xml.push_str("  </BadVersion>\n");
        }

        if !self.links.is_empty() {
            xml.push_str("  <Links>\n");
            for (name, url) in &self.links {
                xml.push_str(&format!("    <{name}>{url}</{name}>\n"));
            }
            xml.push_str("  </Links>\n");
        }

        xml.push_str("</DCUpdate>\n");
        xml
    }
}
