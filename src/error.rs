// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors surfaced by a solve (§7). Internal invariant violations never
//! appear here — those are `unreachable!`/`assert!` panics, since they
//! indicate a bug in the solver itself rather than a recoverable condition.

use thiserror::Error;

use crate::package::PackageReference;
use crate::report::DerivationTree;
use crate::requirement::Requirement;
use crate::version::Revision;

/// Errors that may occur while solving dependencies.
#[derive(Error, Debug)]
pub enum SolveError {
    /// No assignment satisfies the given constraints. Carries the
    /// derivation tree explaining why; render it with
    /// [`crate::report::DefaultStringReporter`].
    #[error("no solution satisfies the given constraints")]
    Unresolvable(DerivationTree),

    /// A container had no matching version for a directly requested exact
    /// constraint while the solver was running in incomplete mode (it was
    /// told not to fetch new containers).
    #[error("no matching version for {package} {requirement} in incomplete mode")]
    MissingVersions {
        /// The package whose constraint could not be matched.
        package: PackageReference,
        /// The unmatched requirement.
        requirement: Requirement,
    },

    /// A versioned dependency transitively imposes a revision pin on a
    /// package that is also constrained by version.
    #[error("{dependency} is pinned to incompatible revisions: {revisions:?}")]
    IncompatibleConstraints {
        /// The package pinned to more than one revision.
        dependency: PackageReference,
        /// The conflicting revisions.
        revisions: Vec<Revision>,
    },

    /// Revision dependencies form a cycle through `package`.
    #[error("dependency cycle detected at {0}")]
    Cycle(PackageReference),

    /// The container provider itself failed.
    #[error("container provider failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}
