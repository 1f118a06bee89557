//! Serde mirror of the XML version manifest.
//!
//! Every field is optional and kept as raw text; [`super::VersionManifest`] applies the
//! lenient conversions. quick-xml maps `@Name` to attributes and `$text` to element text,
//! ignores the root element's name and skips unknown children.
//!
//! Single-valued elements are collected as sequences so a repeated element does not
//! fail the document; the first occurrence is the one that counts.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WireManifest {
    #[serde(rename = "Version")]
    pub version: Vec<String>,
    #[serde(rename = "BuildID")]
    pub build_id: Vec<String>,
    #[serde(rename = "Title")]
    pub title: Vec<String>,
    #[serde(rename = "Message")]
    pub message: Vec<String>,
    #[serde(rename = "URL")]
    pub url: Vec<String>,
    #[serde(rename = "URL64")]
    pub url64: Vec<String>,
    #[serde(rename = "UpdateURL")]
    pub update_url: Vec<WirePackage>,
    #[serde(rename = "UpdateURLx64")]
    pub update_url_x64: Vec<WirePackage>,
    #[serde(rename = "VeryOldVersion")]
    pub very_old_version: Vec<WireVeryOld>,
    #[serde(rename = "BadVersion")]
    pub bad_versions: Vec<WireBadVersion>,
    #[serde(rename = "Links")]
    pub links: Vec<WireLinks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WirePackage {
    #[serde(rename = "@Hash")]
    pub hash: Option<String>,
    #[serde(rename = "@Enabled")]
    pub enabled: Option<String>,
    #[serde(rename = "$text")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WireVeryOld {
    #[serde(rename = "@Message")]
    pub message: Option<String>,
    #[serde(rename = "$text")]
    pub threshold: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WireBadVersion {
    #[serde(rename = "@Version")]
    pub version: Option<String>,
    #[serde(rename = "@Message")]
    pub message: Option<String>,
    /// Entries of the `<BadVersion>` container form.
    #[serde(rename = "BadVersion")]
    pub nested: Vec<WireBadVersion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WireLinks {
    #[serde(rename = "Homepage")]
    pub homepage: Vec<String>,
    #[serde(rename = "Downloads")]
    pub downloads: Vec<String>,
    #[serde(rename = "GeoIPv4")]
    pub geoip4: Vec<String>,
    #[serde(rename = "GeoIPv6")]
    pub geoip6: Vec<String>,
    #[serde(rename = "Languages")]
    pub languages: Vec<String>,
    #[serde(rename = "Forum")]
    pub forum: Vec<String>,
    #[serde(rename = "Guides")]
    pub guides: Vec<String>,
    #[serde(rename = "Customize")]
    pub customize: Vec<String>,
    #[serde(rename = "IPCheck")]
    pub ipcheck: Vec<String>,
}
