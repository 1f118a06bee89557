//! Global constants used throughout the Upkeep codebase.
//!
//! Default endpoints, file names and intervals live here so that the
//! configuration defaults, the orchestrator and the tests agree on them.

use std::time::Duration;

/// Build identifier of the running application.
///
/// Embedders normally override this through [`crate::updater::UpdateManager::builder`];
/// the default is taken from the crate version so `upkeep` can update itself.
pub const RUNNING_BUILD: &str = env!("CARGO_PKG_VERSION");

/// Default location of the signed version manifest.
pub const DEFAULT_MANIFEST_URL: &str = "https://updates.upkeep.dev/version.xml";

/// Suffix appended to the manifest URL to obtain its detached signature.
pub const SIGNATURE_SUFFIX: &str = ".sign";

/// Default homepage, the base of several other links.
pub const DEFAULT_HOMEPAGE: &str = "https://www.upkeep.dev/";

/// Default IPv4 geolocation database source.
pub const DEFAULT_GEOIP4_URL: &str = "https://geoip4.upkeep.dev";

/// Default IPv6 geolocation database source.
pub const DEFAULT_GEOIP6_URL: &str = "https://geoip6.upkeep.dev";

/// Default external IP probe.
pub const DEFAULT_IPCHECK_URL: &str = "http://checkip.dyndns.org/";

/// Default language bundle index.
pub const DEFAULT_LANGUAGE_URL: &str = "https://languages.upkeep.dev/";

/// Script queried with `?file=<name>` to learn the latest version of a language bundle.
pub const LANGUAGE_VERSION_SCRIPT: &str = "checkLangVersion.php";

/// File name of the compressed IPv4 geolocation database.
pub const GEOIP4_FILE: &str = "GeoIP.dat.gz";

/// File name of the compressed IPv6 geolocation database.
pub const GEOIP6_FILE: &str = "GeoIPv6.dat.gz";

/// Name of the downloaded update archive inside the temporary update directory.
pub const PACKAGE_FILE: &str = "Upkeep_Update.zip";

/// Geolocation databases younger than this are not refreshed.
pub const GEO_MAX_AGE: Duration = Duration::from_secs(3600 * 24 * 25);

/// Default interval between automatic checks (24 hours).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 86400;

/// Default HTTP timeout for a single fetch.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// User agent sent by the default transport.
pub const DEFAULT_USER_AGENT: &str = concat!("Upkeep/", env!("CARGO_PKG_VERSION"));

/// Advisory shown when a manifest flags the running build without a message of its own.
pub const DEFAULT_BAD_VERSION_MESSAGE: &str = "Your version of the client contains a serious bug \
    that affects all users of the network or the security of your computer.";

/// Failure reason reported when a downloaded package does not hash to the announced value.
pub const INTEGRITY_FAILURE_REASON: &str = "File integrity check failed";
