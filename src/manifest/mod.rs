//! Version manifest parsing.
//!
//! The update server publishes a small XML document describing the latest build, the
//! package to download and a set of resource links. Its bytes are only handed to
//! [`VersionManifest::parse`] after the detached signature has been verified.
//!
//! # Wire Format
//!
//! ```xml
//! <DCUpdate>
//!   <Version>4.20</Version>
//!   <BuildID>4012</BuildID>
//!   <Title>New version</Title>
//!   <Message>Changelog text</Message>
//!   <URL>https://example.org/download/</URL>
//!   <UpdateURL Hash="ab12..." Enabled="1">https://example.org/pkg.zip</UpdateURL>
//!   <VeryOldVersion Message="Please update">3990</VeryOldVersion>
//!   <BadVersion Version="4001" Message="Broken hashing"/>
//!   <Links><GeoIPv6>https://example.org/geo6</GeoIPv6></Links>
//! </DCUpdate>
//! ```
//!
//! The root element's name is not checked, unknown elements are ignored and every field
//! is optional. Build tokens that do not parse are treated as absent. Only a document
//! that is not well formed fails to parse.
//!
//! # Platform Selection
//!
//! 64-bit Windows builds prefer `UpdateURLx64` and `URL64` when the manifest declares
//! them; see [`TargetTag`].

mod links;
mod wire;


pub use links::{LinkOverrides, Links};

use crate::core::UpkeepError;
use crate::version::BuildId;
use serde::Serialize;
use tracing::debug;

/// Build-time platform tag selecting between generic and x64-specific manifest fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetTag {
    Generic,
    X64Windows,
}

impl TargetTag {
    /// The tag of this build. Deterministic per compiled binary.
    pub const fn current() -> Self {
        if cfg!(all(windows, target_pointer_width = "64")) {
            Self::X64Windows
        } else {
            Self::Generic
        }
    }
}

/// A downloadable update package announced by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRef {
    pub url: String,
    /// Hex digest of the package, possibly prefixed with the algorithm name.
    pub hash: Option<String>,
    /// `false` when the manifest marks in-place updates as disabled (`Enabled="0"`).
    pub enabled: bool,
}

/// Builds at or below `threshold` are told to update urgently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VeryOldVersion {
    pub threshold: BuildId,
    pub message: Option<String>,
}

/// A specific build the server flags as broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeniedBuild {
    pub build: BuildId,
    pub message: Option<String>,
}

/// A parsed, verified version manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionManifest {
    /// Human readable version.
    pub version: Option<String>,
    /// Machine comparable build token.
    pub build_id: Option<BuildId>,
    pub title: Option<String>,
    pub message: Option<String>,
    /// Download page (`URL`).
    pub page_url: Option<String>,
    /// 64-bit download page (`URL64`).
    pub page_url_x64: Option<String>,
    /// Generic package (`UpdateURL`).
    pub update: Option<PackageRef>,
    /// 64-bit Windows package (`UpdateURLx64`).
    pub update_x64: Option<PackageRef>,
    pub very_old_version: Option<VeryOldVersion>,
    pub denied_builds: Vec<DeniedBuild>,
    #[serde(skip)]
    pub links: Option<LinkOverrides>,
}

impl VersionManifest {
    /// Parse manifest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`UpkeepError::ManifestParse`] when the bytes are not UTF-8 or not a
    /// well-formed document. Missing or malformed optional fields are not errors.
    pub fn parse(bytes: &[u8]) -> Result<Self, UpkeepError> {
        let text = std::str::from_utf8(bytes).map_err(|e| UpkeepError::ManifestParse {
            reason: e.to_string(),
        })?;

        let wire: wire::WireManifest =
            quick_xml::de::from_str(text).map_err(|e| UpkeepError::ManifestParse {
                reason: e.to_string(),
            })?;

        Ok(Self::from_wire(wire))
    }

    fn from_wire(wire: wire::WireManifest) -> Self {
        let very_old_version = first(wire.very_old_version).and_then(|v| {
            let threshold = v.threshold.as_deref().and_then(lenient_build)?;
            Some(VeryOldVersion {
                threshold,
                message: non_empty(v.message),
            })
        });

        let mut denied_builds = Vec::new();
        for entry in wire.bad_versions {
            collect_denied(entry, &mut denied_builds);
        }

        Self {
            version: non_empty(first(wire.version)),
            build_id: first(wire.build_id).as_deref().and_then(lenient_build),
            title: non_empty(first(wire.title)),
            message: non_empty(first(wire.message)),
            page_url: non_empty(first(wire.url)),
            page_url_x64: non_empty(first(wire.url64)),
            update: first(wire.update_url).and_then(package_ref),
            update_x64: first(wire.update_url_x64).and_then(package_ref),
            very_old_version,
            denied_builds,
            links: first(wire.links).map(link_overrides).filter(|l| !l.is_empty()),
        }
    }

    /// The package for `target`, preferring the x64 entry on x64 Windows.
    pub fn package_for(&self, target: TargetTag) -> Option<&PackageRef> {
        match target {
            TargetTag::X64Windows => self.update_x64.as_ref().or(self.update.as_ref()),
            TargetTag::Generic => self.update.as_ref(),
        }
    }

    /// The download page for `target`, preferring `URL64` on x64 Windows.
    pub fn page_url_for(&self, target: TargetTag) -> Option<&str> {
        match target {
            TargetTag::X64Windows => self.page_url_x64.as_deref().or(self.page_url.as_deref()),
            TargetTag::Generic => self.page_url.as_deref(),
        }
    }

    /// The package for this build.
    pub fn package(&self) -> Option<&PackageRef> {
        self.package_for(TargetTag::current())
    }

    /// The download page for this build.
    pub fn page_url(&self) -> Option<&str> {
        self.page_url_for(TargetTag::current())
    }

    /// Resolved package URL for this build.
    pub fn update_url(&self) -> Option<&str> {
        self.package().map(|p| p.url.as_str())
    }

    /// Whether in-place updating is enabled for this build's package.
    pub fn update_enabled(&self) -> bool {
        self.package().is_some_and(|p| p.enabled)
    }

    /// Expected hash of this build's package.
    pub fn package_hash(&self) -> Option<&str> {
        self.package().and_then(|p| p.hash.as_deref())
    }

    /// The advisory message when `running` is flagged as broken or too old.
    ///
    /// An explicit `BadVersion` entry wins over the `VeryOldVersion` threshold. Returns
    /// `Some(None)` when flagged without a message of its own.
    pub fn advisory_for(&self, running: &BuildId) -> Option<Option<&str>> {
        if let Some(denied) = self.denied_builds.iter().find(|d| &d.build == running) {
            return Some(denied.message.as_deref());
        }
        match &self.very_old_version {
            Some(old) if running <= &old.threshold => Some(old.message.as_deref()),
            _ => None,
        }
    }
}

fn first<T>(values: Vec<T>) -> Option<T> {
    values.into_iter().next()
}

/// Flatten a `BadVersion` entry: either a flagged build itself or a container of them.
fn collect_denied(entry: wire::WireBadVersion, out: &mut Vec<DeniedBuild>) {
    if let Some(build) = entry.version.as_deref().and_then(lenient_build) {
        out.push(DeniedBuild {
            build,
            message: non_empty(entry.message),
        });
    }
    for child in entry.nested {
        collect_denied(child, out);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn lenient_build(token: &str) -> Option<BuildId> {
    let parsed = BuildId::parse_lenient(token);
    if parsed.is_none() {
        debug!("Ignoring unparsable build token '{}'", token);
    }
    parsed
}

fn package_ref(wire: wire::WirePackage) -> Option<PackageRef> {
    let url = non_empty(wire.url)?;
    let enabled = wire.enabled.as_deref().map_or(true, |e| e.trim() == "1");
    Some(PackageRef {
        url,
        hash: non_empty(wire.hash),
        enabled,
    })
}

fn link_overrides(wire: wire::WireLinks) -> LinkOverrides {
    LinkOverrides {
        homepage: non_empty(first(wire.homepage)),
        downloads: non_empty(first(wire.downloads)),
        geoip4: non_empty(first(wire.geoip4)),
        geoip6: non_empty(first(wire.geoip6)),
        language: non_empty(first(wire.languages)),
        discuss: non_empty(first(wire.forum)),
        guides: non_empty(first(wire.guides)),
        customize: non_empty(first(wire.customize)),
        ipcheck: non_empty(first(wire.ipcheck)),
    }
}
