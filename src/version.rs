// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Concrete version and revision identifiers.

use std::fmt;
use std::sync::Arc;

/// `major.minor.patch`, ordered lexicographically on the triple.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    /// Create a version with `major`, `minor` and `patch` values.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version 0.0.0, the lowest representable version.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Version 1.0.0.
    pub fn one() -> Self {
        Self::new(1, 0, 0)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// The smallest strictly higher version, used to build the half-open
    /// range `[v, v.bump())` that makes `exact(v)` comparable to ranges.
    pub fn bump(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    /// The smallest version with a strictly higher major component, reset
    /// to `.0.0`. Used as the upper bound of a picked version's self-term
    /// (§4.6): `range(v..<next_major)`.
    ///
    /// Note: when dependencies genuinely change across minor/patch releases
    /// within the same major version, this upper bound is wider than what
    /// was actually solved for, which degrades diagnostic quality. This
    /// mirrors a known limitation rather than a bug in this crate.
    pub fn next_major(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }
}

impl From<(u32, u32, u32)> for Version {
    fn from(tuple: (u32, u32, u32)) -> Self {
        let (major, minor, patch) = tuple;
        Self::new(major, minor, patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A named commit or branch. Revision pins are strictly stronger than any
/// version range (§4.1): a revision requirement is satisfied only by the
/// identical revision, but a revision decision is considered to contain
/// any version-set requirement.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Revision(Arc<str>);

impl Revision {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Revision {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_major_resets_minor_and_patch() {
        assert_eq!(Version::new(1, 4, 2).next_major(), Version::new(2, 0, 0));
    }

    #[test]
    fn bump_only_advances_patch() {
        assert_eq!(Version::new(1, 4, 2).bump(), Version::new(1, 4, 3));
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
        assert!(Version::new(1, 2, 3) < Version::new(1, 2, 4));
    }
}
