// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! External collaborators the solver consults for version lists and
//! dependency information, but never fetches or enumerates itself (§1, §4.7,
//! §6). Fetching a container is assumed to be expensive (network or git
//! I/O); [`crate::gateway::ContainerGateway`] is what makes that cheap to
//! call repeatedly during a solve.

use crate::package::PackageReference;
use crate::requirement::Requirement;
use crate::version::{Revision, Version};

/// One (package, requirement) edge of a dependency graph.
pub type Constraint = (PackageReference, Requirement);

/// A fetched view of one package: its available versions and, for any of
/// them, its dependencies.
pub trait Container: Send + Sync {
    /// This container's own canonical identity.
    fn identifier(&self) -> &PackageReference;

    /// Every version this container knows about, already filtered to
    /// whatever this container considers installable (yanked releases,
    /// pre-releases the provider chooses to hide, etc.) and in descending
    /// order. Containment against a requirement is the solver's job, not
    /// the container's.
    fn versions(&self) -> Vec<Version>;

    /// Dependencies of this package at a concrete version.
    fn dependencies_at_version(&self, version: &Version) -> Vec<Constraint>;

    /// Dependencies of this package at a named revision.
    fn dependencies_at_revision(&self, revision: &Revision) -> Vec<Constraint>;

    /// Dependencies of this package's unversioned (local working-copy)
    /// binding.
    fn unversioned_dependencies(&self) -> Vec<Constraint>;

    /// Containers may canonicalize a package's identity once its bound
    /// version is known (e.g. resolving a path alias). Called once per
    /// decision when the final assignment is emitted.
    fn updated_identifier(&self, bound: &crate::solver::BoundVersion) -> PackageReference;
}

/// Supplies [`Container`]s for packages on request. Implementations may
/// perform network or git I/O; the solver never calls this directly,
/// always through a [`crate::gateway::ContainerGateway`].
pub trait ContainerProvider: Send + Sync {
    /// The concrete container type this provider produces.
    type Container: Container;
    /// Error type for a failed fetch.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Fetch (or look up) the container for `package`. May block. When
    /// `skip_update` is set the provider must not perform network I/O to
    /// discover new versions — it returns whatever it already has cached,
    /// or an error if it has nothing.
    fn get_container(
        &self,
        package: &PackageReference,
        skip_update: bool,
    ) -> Result<Self::Container, Self::Err>;
}
