// SPDX-License-Identifier: MPL-2.0

//! An in-memory [`ContainerProvider`], grounded on the teacher crate's
//! `OfflineDependencyProvider`. This is not a production feature — real
//! callers fetch containers from a registry or VCS — but it gives the end
//! to end scenarios, doctests, and a caller's own experiments something
//! concrete to resolve against without standing up a real backend.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::container::{Constraint, Container, ContainerProvider};
use crate::package::PackageReference;
use crate::requirement::Requirement;
use crate::solver::BoundVersion;
use crate::type_aliases::Map;
use crate::version::{Revision, Version};

/// One package's worth of in-memory version/revision/unversioned
/// dependency data.
#[derive(Debug, Clone, Default)]
struct OfflineEntry {
    versions: BTreeMap<Version, Vec<Constraint>>,
    revisions: Map<Revision, Vec<Constraint>>,
    unversioned: Option<Vec<Constraint>>,
}

/// A [`Container`] backed by an [`OfflineEntry`] known in advance. Returned
/// by [`OfflineContainerProvider::get_container`].
#[derive(Debug, Clone)]
pub struct OfflineContainer {
    identifier: PackageReference,
    entry: OfflineEntry,
}

impl Container for OfflineContainer {
    fn identifier(&self) -> &PackageReference {
        &self.identifier
    }

    fn versions(&self) -> Vec<Version> {
        self.entry.versions.keys().rev().cloned().collect()
    }

    fn dependencies_at_version(&self, version: &Version) -> Vec<Constraint> {
        self.entry
            .versions
            .get(version)
            .cloned()
            .unwrap_or_default()
    }

    fn dependencies_at_revision(&self, revision: &Revision) -> Vec<Constraint> {
        self.entry
            .revisions
            .get(revision)
            .cloned()
            .unwrap_or_default()
    }

    fn unversioned_dependencies(&self) -> Vec<Constraint> {
        self.entry.unversioned.clone().unwrap_or_default()
    }

    fn updated_identifier(&self, _bound: &BoundVersion) -> PackageReference {
        self.identifier.clone()
    }
}

/// An in-memory [`ContainerProvider`] populated with all dependency
/// information up front. Currently saved packages are returned verbatim;
/// a package never registered resolves to an empty container (no
/// versions, no revisions, no unversioned dependencies) rather than an
/// error, so an unsatisfiable constraint surfaces through the normal
/// `NoAvailableVersion` path instead of a provider failure.
#[derive(Debug, Clone, Default)]
pub struct OfflineContainerProvider {
    entries: Map<PackageReference, OfflineEntry>,
}

impl OfflineContainerProvider {
    /// An empty provider with no packages registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dependencies of `identity` at `version`. A second call
    /// for the same `(identity, version)` pair replaces the first.
    pub fn add_version(
        &mut self,
        identity: impl Into<Arc<str>>,
        version: Version,
        deps: impl IntoIterator<Item = (String, Requirement)>,
    ) {
        let constraints = deps
            .into_iter()
            .map(|(name, req)| (PackageReference::new(name), req))
            .collect();
        self.entries
            .entry(PackageReference::new(identity))
            .or_default()
            .versions
            .insert(version, constraints);
    }

    /// Register the dependencies of `identity` at named `revision`.
    pub fn add_revision(
        &mut self,
        identity: impl Into<Arc<str>>,
        revision: Revision,
        deps: impl IntoIterator<Item = (String, Requirement)>,
    ) {
        let constraints = deps
            .into_iter()
            .map(|(name, req)| (PackageReference::new(name), req))
            .collect();
        self.entries
            .entry(PackageReference::new(identity))
            .or_default()
            .revisions
            .insert(revision, constraints);
    }

    /// Register the dependencies of `identity`'s unversioned (local
    /// working-copy) binding.
    pub fn add_unversioned(
        &mut self,
        identity: impl Into<Arc<str>>,
        deps: impl IntoIterator<Item = (String, Requirement)>,
    ) {
        let constraints = deps
            .into_iter()
            .map(|(name, req)| (PackageReference::new(name), req))
            .collect();
        self.entries
            .entry(PackageReference::new(identity))
            .or_default()
            .unversioned = Some(constraints);
    }
}

impl ContainerProvider for OfflineContainerProvider {
    type Container = OfflineContainer;
    type Err = Infallible;

    fn get_container(
        &self,
        package: &PackageReference,
        _skip_update: bool,
    ) -> Result<Self::Container, Infallible> {
        let entry = self.entries.get(package).cloned().unwrap_or_default();
        Ok(OfflineContainer {
            identifier: package.clone(),
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_package_has_no_versions() {
        let provider = OfflineContainerProvider::new();
        let container = provider
            .get_container(&PackageReference::new("missing"), false)
            .unwrap();
        assert!(container.versions().is_empty());
    }

    #[test]
    fn versions_are_returned_in_descending_order() {
        let mut provider = OfflineContainerProvider::new();
        provider.add_version("a", Version::new(1, 0, 0), []);
        provider.add_version("a", Version::new(2, 0, 0), []);
        provider.add_version("a", Version::new(1, 5, 0), []);
        let container = provider
            .get_container(&PackageReference::new("a"), false)
            .unwrap();
        assert_eq!(
            container.versions(),
            vec![
                Version::new(2, 0, 0),
                Version::new(1, 5, 0),
                Version::new(1, 0, 0)
            ]
        );
    }
}
