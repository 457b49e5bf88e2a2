//! Release version identifiers and the API versions derived from them.

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Keeps `api_version()` within `u32` for any parsed version.
const MAX_COMPONENT: u32 = 9_999;

/// A `major.minor.patch` release version.
///
/// Ordering is lexicographic over the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major release number.
    pub major: u32,
    /// Minor release number.
    pub minor: u32,
    /// Patch release number.
    pub patch: u32,
}

impl Version {
    /// Creates a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The client API revision matching this release (`major*100 + minor*10`).
    ///
    /// Saturates for components beyond what [`FromStr`] accepts.
    pub const fn api_version(&self) -> u32 {
        self.major
            .saturating_mul(100)
            .saturating_add(self.minor.saturating_mul(10))
    }

    /// Whether clients of `other` speak the same wire protocol as this release.
    ///
    /// Patch releases share a protocol; any major or minor difference does not.
    pub fn is_protocol_compatible(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(HarnessError::InvalidVersion(s.to_string()));
        }

        let mut components = [0u32; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .ok()
                .filter(|c| *c <= MAX_COMPONENT)
                .ok_or_else(|| HarnessError::InvalidVersion(s.to_string()))?;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

// Versions appear as plain strings in config files and reports.
impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Symbolic name for one of the releases a harness run works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionRole {
    /// The release under development.
    Current,
    /// The previous release.
    Prev,
    /// The release before the previous one.
    Prev2,
}

/// The concrete releases behind each [`VersionRole`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSet {
    /// Release under development.
    pub current: Version,
    /// Previous release.
    pub prev: Version,
    /// Release before the previous one.
    pub prev2: Version,
}

impl VersionSet {
    /// Resolves a role to its release.
    pub fn resolve(&self, role: VersionRole) -> Version {
        match role {
            VersionRole::Current => self.current,
            VersionRole::Prev => self.prev,
            VersionRole::Prev2 => self.prev2,
        }
    }
}

impl Default for VersionSet {
    fn default() -> Self {
        Self {
            current: Version::new(7, 3, 0),
            prev: Version::new(7, 2, 5),
            prev2: Version::new(7, 1, 41),
        }
    }
}
