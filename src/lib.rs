// SPDX-License-Identifier: MPL-2.0

//! A PubGrub-style version solver for a package manager.
//!
//! Given a root package and a set of dependency constraints, [`Solver::solve`]
//! produces either a unique assignment of a concrete version, revision, or
//! unversioned local binding to every transitively required package, or a
//! human-readable explanation of why no such assignment exists.
//!
//! # Scope
//!
//! This crate is the solving core only. Fetching packages over the network
//! or from a VCS, enumerating a package's available versions, extracting
//! its dependencies at a specific version, CLI parsing, and persisting a
//! pinning file are all treated as external collaborators the solver
//! consults through the [`Container`]/[`ContainerProvider`] traits. This
//! crate never performs I/O itself.
//!
//! # Basic example
//!
//! ```
//! use version_solver::{OfflineContainerProvider, Options, PackageReference, Requirement, Solver, Version};
//!
//! let mut provider = OfflineContainerProvider::new();
//! provider.add_version("menu", Version::new(1, 0, 0), [("icons".to_string(), Requirement::any())]);
//! provider.add_version("icons", Version::new(1, 0, 0), []);
//!
//! let solver = Solver::new(provider, Options::new()).unwrap();
//! let solution = solver
//!     .solve(
//!         vec![(PackageReference::new("menu"), Requirement::any())],
//!         vec![],
//!     )
//!     .unwrap();
//! assert!(solution.iter().any(|(p, _)| p.identity() == "menu"));
//! ```
//!
//! # Implementing a container provider
//!
//! Real callers implement [`ContainerProvider`] and [`Container`] against
//! whatever registry or VCS the package manager actually talks to;
//! [`OfflineContainerProvider`] is an in-memory stand-in used by this
//! crate's own tests and doc examples.
//!
//! # Diagnostics
//!
//! When [`Solver::solve`] cannot find an assignment, it returns
//! [`SolveError::Unresolvable`], which carries a [`DerivationTree`]
//! describing the full chain of reasons. Render it with
//! [`DefaultStringReporter`]:
//!
//! ```no_run
//! use version_solver::{DefaultStringReporter, Reporter, SolveError};
//! # fn handle<CP: version_solver::ContainerProvider + 'static>(
//! #     solver: version_solver::Solver<CP>,
//! # ) {
//! match solver.solve(vec![], vec![]) {
//!     Ok(solution) => println!("{:?}", solution),
//!     Err(SolveError::Unresolvable(tree)) => {
//!         eprintln!("{}", DefaultStringReporter::report(&tree));
//!     }
//!     Err(err) => eprintln!("{err}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod container;
mod error;
mod gateway;
mod offline;
mod options;
mod package;
mod report;
mod requirement;
mod solver;
mod term;
mod trace;
mod version;

pub use container::{Constraint, Container, ContainerProvider};
pub use error::SolveError;
pub use gateway::{ContainerGateway, GatewayError};
pub use offline::{OfflineContainer, OfflineContainerProvider};
pub use options::Options;
pub use package::PackageReference;
pub use report::{
    DefaultStringReporter, DerivationTree, Derived, External, Reporter,
};
pub use requirement::{Requirement, VersionSetSpec};
pub use solver::{BoundVersion, Solution, Solver};
pub use term::{Relation, Term};
pub use trace::{FileTraceSink, NullTraceSink, TraceEvent, TraceKind, TraceLocation, TraceSink};
pub use version::{Revision, Version};

mod internal;
mod type_aliases;
