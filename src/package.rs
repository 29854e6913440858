// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identity of a package as seen by the solver.

use std::fmt;
use std::sync::Arc;

/// Opaque, equatable, hashable identifier for a package.
///
/// The solver never interprets the identity string; it is whatever a
/// [`ContainerProvider`](crate::container::ContainerProvider) hands back.
/// `name` is an optional display name used only in diagnostics, and
/// `is_local` marks a package bound to a working copy on disk rather than
/// a registry entry; it does not change solving semantics.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PackageReference {
    identity: Arc<str>,
    name: Option<Arc<str>>,
    is_local: bool,
}

/// Identity reserved for the synthetic root package. No
/// [`ContainerProvider`](crate::container::ContainerProvider) is ever asked
/// about this identity; `$` is not a character real package identities are
/// documented to contain.
const ROOT_IDENTITY: &str = "$root$";

impl PackageReference {
    /// Build a reference to a package known by its registry/VCS identity.
    pub fn new(identity: impl Into<Arc<str>>) -> Self {
        Self {
            identity: identity.into(),
            name: None,
            is_local: false,
        }
    }

    /// Attach a human-readable display name, distinct from the identity
    /// used for equality and hashing.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark this reference as bound to a local working copy.
    pub fn with_local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    /// The synthetic root package the solver seeds itself with.
    pub fn root() -> Self {
        Self {
            identity: Arc::from(ROOT_IDENTITY),
            name: Some(Arc::from("<root>")),
            is_local: false,
        }
    }

    /// True if this is the solver's synthetic root, never a real container.
    pub fn is_root(&self) -> bool {
        &*self.identity == ROOT_IDENTITY
    }

    /// The identity string used for equality, hashing, and container lookup.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// True if this package is bound to a local working copy.
    pub fn is_local(&self) -> bool {
        self.is_local
    }
}

impl fmt::Debug for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageReference")
            .field("identity", &self.identity)
            .field("name", &self.name)
            .field("is_local", &self.is_local)
            .finish()
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_reserved_and_stable() {
        assert!(PackageReference::root().is_root());
        assert!(!PackageReference::new("left-pad").is_root());
    }

    #[test]
    fn equality_is_by_identity_not_display_name() {
        let a = PackageReference::new("left-pad").with_name("Left Pad");
        let b = PackageReference::new("left-pad");
        assert_eq!(a, b);
    }
}
