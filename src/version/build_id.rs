//! Comparable build identifiers.
//!
//! A [`BuildId`] is the machine-comparable token a manifest announces (`<BuildID>`),
//! distinct from the human-readable version string. Tokens are dotted numbers such as
//! `4012`, `2.31` or `1.2.10`; an optional leading `v` or `r` (tag or revision style) is
//! accepted and ignored.
//!
//! Ordering is numeric per component, never lexicographic: `1.10 > 1.9`, and missing
//! trailing components count as zero so `1.2 == 1.2.0`.
//!
//! ```rust
//! use upkeep_cli::version::BuildId;
//!
//! let running: BuildId = "4012".parse().unwrap();
//! let remote: BuildId = "4100".parse().unwrap();
//! assert!(remote > running);
//! assert_eq!("1.2".parse::<BuildId>().unwrap(), "1.2.0".parse().unwrap());
//! ```

use crate::core::UpkeepError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric build token with a total numeric order.
#[derive(Debug, Clone)]
pub struct BuildId {
    components: Vec<u64>,
}

impl BuildId {
    /// Build an identifier from numeric components.
    #[must_use]
    pub fn from_components(components: Vec<u64>) -> Self {
        Self {
            components,
        }
    }

    /// The numeric components as parsed.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Parse a token, returning `None` instead of an error.
    ///
    /// Manifest fields use this: a token that does not parse is treated as absent.
    pub fn parse_lenient(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn significant(&self) -> &[u64] {
        let len = self.components.iter().rposition(|c| *c != 0).map_or(0, |i| i + 1);
        &self.components[..len]
    }
}

impl FromStr for BuildId {
    type Err = UpkeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(['v', 'V', 'r', 'R']).unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(UpkeepError::InvalidBuildId {
                token: s.to_string(),
            });
        }

        let components = digits
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| UpkeepError::InvalidBuildId {
                token: s.to_string(),
            })?;

        Ok(Self {
            components,
        })
    }
}

impl Ord for BuildId {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for BuildId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BuildId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BuildId {}

impl std::hash::Hash for BuildId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Must agree with Eq, so trailing zeros are ignored
        self.significant().hash(state);
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl Serialize for BuildId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BuildId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
