//! Server-announced resource locations.

use crate::constants::{
    DEFAULT_GEOIP4_URL, DEFAULT_GEOIP6_URL, DEFAULT_HOMEPAGE, DEFAULT_IPCHECK_URL,
    DEFAULT_LANGUAGE_URL,
};
use serde::{Deserialize, Serialize};

/// Locations of the auxiliary resources and project pages.
///
/// The only manifest-derived state that outlives a parse: the orchestrator keeps one
/// `Links` value and merges each verified manifest's `<Links>` block into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub homepage: String,
    pub downloads: String,
    pub geoip4: String,
    pub geoip6: String,
    /// Base URL of the language bundles, ending in `/`.
    pub language: String,
    pub discuss: String,
    pub guides: String,
    pub customize: String,
    /// Page whose body contains the caller's public IPv4 address.
    pub ipcheck: String,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            homepage: DEFAULT_HOMEPAGE.to_string(),
            downloads: format!("{DEFAULT_HOMEPAGE}download/"),
            geoip4: DEFAULT_GEOIP4_URL.to_string(),
            geoip6: DEFAULT_GEOIP6_URL.to_string(),
            language: DEFAULT_LANGUAGE_URL.to_string(),
            discuss: format!("{DEFAULT_HOMEPAGE}discussion/"),
            guides: format!("{DEFAULT_HOMEPAGE}guides/"),
            customize: format!("{DEFAULT_HOMEPAGE}customizations/"),
            ipcheck: DEFAULT_IPCHECK_URL.to_string(),
        }
    }
}

/// The `<Links>` block of one manifest. Absent children stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOverrides {
    pub homepage: Option<String>,
    pub downloads: Option<String>,
    pub geoip4: Option<String>,
    pub geoip6: Option<String>,
    pub language: Option<String>,
    pub discuss: Option<String>,
    pub guides: Option<String>,
    pub customize: Option<String>,
    pub ipcheck: Option<String>,
}

impl LinkOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Links {
    /// Overwrite the fields the manifest carried, keep the rest.
    pub fn merge(&mut self, overrides: &LinkOverrides) {
        fn apply(target: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        apply(&mut self.homepage, &overrides.homepage);
        apply(&mut self.downloads, &overrides.downloads);
        apply(&mut self.geoip4, &overrides.geoip4);
        apply(&mut self.geoip6, &overrides.geoip6);
        apply(&mut self.language, &overrides.language);
        apply(&mut self.discuss, &overrides.discuss);
        apply(&mut self.guides, &overrides.guides);
        apply(&mut self.customize, &overrides.customize);
        apply(&mut self.ipcheck, &overrides.ipcheck);
    }
}
